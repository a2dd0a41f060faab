//! SQL dialect selection.
//!
//! The repository builds its statements through a [`Dialect`] so that the
//! engine-specific pieces (row window clause, identifier quoting, whether
//! rows can be locked) are decided once, when the pool is created.

use crate::error::{AppError, AppResult};

/// Where the limit/offset clause goes in a SELECT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClausePosition {
    AfterOrderBy,
}

/// How identifiers are quoted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierQuoting {
    /// `"name"`, embedded quotes doubled
    Ansi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    name: &'static str,
    limit_position: ClausePosition,
    quoting: IdentifierQuoting,
    row_locking: bool,
}

impl Dialect {
    pub const SQLITE: Dialect = Dialect {
        name: "sqlite",
        limit_position: ClausePosition::AfterOrderBy,
        quoting: IdentifierQuoting::Ansi,
        row_locking: false,
    };

    /// Pick the dialect matching a connection URL
    pub fn for_url(url: &str) -> AppResult<Self> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme {
            "sqlite" => Ok(Self::SQLITE),
            other => Err(AppError::Internal(format!(
                "Unsupported database scheme '{}'",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn limit_position(&self) -> ClausePosition {
        self.limit_position
    }

    /// SQLite has no `SELECT ... FOR UPDATE`
    pub fn supports_row_locking(&self) -> bool {
        self.row_locking
    }

    pub fn limit(&self, limit: i64) -> String {
        format!("LIMIT {}", limit)
    }

    pub fn limit_offset(&self, limit: i64, offset: i64) -> String {
        format!("LIMIT {} OFFSET {}", limit, offset)
    }

    pub fn quote(&self, identifier: &str) -> String {
        match self.quoting {
            IdentifierQuoting::Ansi => format!("\"{}\"", identifier.replace('"', "\"\"")),
        }
    }
}
