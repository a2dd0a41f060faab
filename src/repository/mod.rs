//! Repository layer for database operations

pub mod books;
pub mod dialect;

use async_trait::async_trait;
use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::Book,
};

pub use books::BooksRepository;
pub use dialect::Dialect;

/// Row window applied to list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: i64,
    pub offset: i64,
}

impl Window {
    pub const DEFAULT_PER_PAGE: i64 = 20;
    pub const MAX_PER_PAGE: i64 = 100;

    /// Window for a 1-based page number. Fails when the offset does not fit in an `i64`.
    pub fn page(page: Option<i64>, per_page: Option<i64>) -> AppResult<Self> {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE);
        let offset = (page - 1)
            .checked_mul(per_page)
            .ok_or_else(|| AppError::BadRequest(format!("page {} is out of range", page)))?;
        Ok(Self {
            limit: per_page,
            offset,
        })
    }
}

/// Data access for the books table.
///
/// Finders report absence as `None` or an empty list; deleting a missing id
/// is a no-op. `save` inserts when the book has no id and updates otherwise.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find_all(&self) -> AppResult<Vec<Book>>;

    async fn find_all_windowed(&self, window: Window) -> AppResult<Vec<Book>>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>>;

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>>;

    /// Exact author match
    async fn find_by_author(&self, author: &str) -> AppResult<Vec<Book>>;

    async fn find_by_title_containing(&self, fragment: &str) -> AppResult<Vec<Book>>;

    async fn exists_by_id(&self, id: i64) -> AppResult<bool>;

    async fn delete_by_id(&self, id: i64) -> AppResult<()>;

    async fn save(&self, book: Book) -> AppResult<Book>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Sqlite>,
    pub books: BooksRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Sqlite>, dialect: Dialect) -> Self {
        Self {
            books: BooksRepository::new(pool.clone(), dialect),
            pool,
        }
    }

    /// Round-trip a trivial query to check connectivity
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
