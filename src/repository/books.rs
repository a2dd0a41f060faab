//! Books repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::{
    prelude::{FromPrimitive, ToPrimitive},
    Decimal,
};
use sqlx::{FromRow, Pool, Sqlite};

use super::{
    dialect::{ClausePosition, Dialect},
    BookRepository, Window,
};
use crate::{
    error::{AppError, AppResult},
    models::Book,
};

const COLUMNS: [&str; 8] = [
    "id",
    "title",
    "author",
    "isbn",
    "price",
    "quantity",
    "created_at",
    "updated_at",
];

/// Raw `books` row; price is read back as REAL and rounded into a Decimal
#[derive(Debug, FromRow)]
struct BookRow {
    id: i64,
    title: String,
    author: String,
    isbn: Option<String>,
    price: Option<f64>,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: Some(row.id),
            title: row.title,
            author: row.author,
            isbn: row.isbn,
            price: row
                .price
                .and_then(Decimal::from_f64)
                .map(|p| p.round_dp(2)),
            quantity: row.quantity,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        }
    }
}

fn price_param(price: Option<Decimal>) -> Option<f64> {
    price.and_then(|p| p.round_dp(2).to_f64())
}

/// Escape LIKE wildcards so the fragment matches literally (`ESCAPE '\'`)
fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Map store errors raised by writes; the UNIQUE index on isbn is the
/// authoritative duplicate guard.
fn map_write_error(err: sqlx::Error, isbn: Option<&str>) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return AppError::duplicate_isbn(isbn.unwrap_or_default());
        }
    }
    AppError::Database(err)
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
    dialect: Dialect,
    table: String,
    select_list: String,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>, dialect: Dialect) -> Self {
        let select_list = COLUMNS
            .iter()
            .map(|col| {
                let quoted = dialect.quote(col);
                if *col == "price" {
                    format!("CAST({} AS REAL) AS {}", quoted, quoted)
                } else {
                    quoted
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            pool,
            table: dialect.quote("books"),
            dialect,
            select_list,
        }
    }

    fn col(&self, name: &str) -> String {
        self.dialect.quote(name)
    }

    /// SELECT over the books table, ordered by id
    fn select_sql(&self, filter: Option<&str>, window: Option<Window>) -> String {
        let mut sql = format!("SELECT {} FROM {}", self.select_list, self.table);
        if let Some(filter) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(&self.col("id"));

        if let Some(window) = window {
            match self.dialect.limit_position() {
                ClausePosition::AfterOrderBy => {
                    sql.push(' ');
                    if window.offset > 0 {
                        sql.push_str(&self.dialect.limit_offset(window.limit, window.offset));
                    } else {
                        sql.push_str(&self.dialect.limit(window.limit));
                    }
                }
            }
        }
        sql
    }

    async fn insert(&self, book: &Book) -> AppResult<Book> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            self.table,
            self.col("title"),
            self.col("author"),
            self.col("isbn"),
            self.col("price"),
            self.col("quantity"),
            self.col("created_at"),
            self.col("updated_at"),
            self.select_list,
        );

        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.isbn)
            .bind(price_param(book.price))
            .bind(book.quantity)
            .bind(book.created_at.unwrap_or(now))
            .bind(book.updated_at.unwrap_or(now))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, book.isbn.as_deref()))?;

        Ok(row.into())
    }

    async fn update(&self, id: i64, book: &Book) -> AppResult<Book> {
        let sql = format!(
            "UPDATE {} SET {} = ?, {} = ?, {} = ?, {} = ?, {} = ?, {} = ? WHERE {} = ? RETURNING {}",
            self.table,
            self.col("title"),
            self.col("author"),
            self.col("isbn"),
            self.col("price"),
            self.col("quantity"),
            self.col("updated_at"),
            self.col("id"),
            self.select_list,
        );

        sqlx::query_as::<_, BookRow>(&sql)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.isbn)
            .bind(price_param(book.price))
            .bind(book.quantity)
            .bind(book.updated_at.unwrap_or_else(Utc::now))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, book.isbn.as_deref()))?
            .map(Book::from)
            .ok_or_else(|| AppError::book_not_found(id))
    }
}

#[async_trait]
impl BookRepository for BooksRepository {
    async fn find_all(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(&self.select_sql(None, None))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn find_all_windowed(&self, window: Window) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(&self.select_sql(None, Some(window)))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        let filter = format!("{} = ?", self.col("id"));
        let row = sqlx::query_as::<_, BookRow>(&self.select_sql(Some(&filter), None))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Book::from))
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let filter = format!("{} = ?", self.col("isbn"));
        let row = sqlx::query_as::<_, BookRow>(&self.select_sql(Some(&filter), None))
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Book::from))
    }

    async fn find_by_author(&self, author: &str) -> AppResult<Vec<Book>> {
        let filter = format!("{} = ?", self.col("author"));
        let rows = sqlx::query_as::<_, BookRow>(&self.select_sql(Some(&filter), None))
            .bind(author)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn find_by_title_containing(&self, fragment: &str) -> AppResult<Vec<Book>> {
        let filter = format!("{} LIKE ? ESCAPE '\\'", self.col("title"));
        let rows = sqlx::query_as::<_, BookRow>(&self.select_sql(Some(&filter), None))
            .bind(like_pattern(fragment))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn exists_by_id(&self, id: i64) -> AppResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?)",
            self.table,
            self.col("id")
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn delete_by_id(&self, id: i64) -> AppResult<()> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", self.table, self.col("id"));
        sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn save(&self, book: Book) -> AppResult<Book> {
        match book.id {
            Some(id) => self.update(id, &book).await,
            None => self.insert(&book).await,
        }
    }
}
