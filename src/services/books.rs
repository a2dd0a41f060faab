//! Book inventory service

use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookInput, BookPatch, BookQuery},
    repository::{BookRepository, Window},
};

#[derive(Clone)]
pub struct BooksService {
    repository: Arc<dyn BookRepository>,
}

impl BooksService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }

    pub async fn get_all_books(&self) -> AppResult<Vec<Book>> {
        self.repository.find_all().await
    }

    pub async fn get_book_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        self.repository.find_by_id(id).await
    }

    pub async fn get_book_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        self.repository.find_by_isbn(isbn).await
    }

    pub async fn get_books_by_author(&self, author: &str) -> AppResult<Vec<Book>> {
        self.repository.find_by_author(author).await
    }

    pub async fn search_books_by_title(&self, fragment: &str) -> AppResult<Vec<Book>> {
        self.repository.find_by_title_containing(fragment).await
    }

    /// List books for the API. The first filter present wins (isbn, author,
    /// title); paging applies when `page` or `per_page` is given.
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let window = (query.page.is_some() || query.per_page.is_some())
            .then(|| Window::page(query.page, query.per_page))
            .transpose()?;

        if let Some(ref isbn) = query.isbn {
            return Ok(self.get_book_by_isbn(isbn).await?.into_iter().collect());
        }

        let books = if let Some(ref author) = query.author {
            self.get_books_by_author(author).await?
        } else if let Some(ref title) = query.title {
            self.search_books_by_title(title).await?
        } else {
            return match window {
                Some(window) => self.repository.find_all_windowed(window).await,
                None => self.get_all_books().await,
            };
        };

        Ok(match window {
            Some(window) => books
                .into_iter()
                .skip(usize::try_from(window.offset).unwrap_or(usize::MAX))
                .take(usize::try_from(window.limit).unwrap_or(usize::MAX))
                .collect(),
            None => books,
        })
    }

    /// Create a book; the ISBN must not belong to any stored book
    pub async fn create_book(&self, input: &BookInput) -> AppResult<Book> {
        if let Some(ref isbn) = input.isbn {
            if self.repository.find_by_isbn(isbn).await?.is_some() {
                return Err(AppError::duplicate_isbn(isbn));
            }
        }

        let book = self.repository.save(input.to_new_book(Utc::now())).await?;
        tracing::info!("Created book id={:?} isbn={:?}", book.id, book.isbn);
        Ok(book)
    }

    /// Replace all mutable fields of an existing book
    pub async fn update_book(&self, id: i64, input: &BookInput) -> AppResult<Book> {
        let mut book = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::book_not_found(id))?;

        if let Some(ref isbn) = input.isbn {
            if book.isbn.as_deref() != Some(isbn.as_str()) {
                if let Some(other) = self.repository.find_by_isbn(isbn).await? {
                    if other.id != book.id {
                        return Err(AppError::duplicate_isbn(isbn));
                    }
                }
            }
        }

        input.replace_into(&mut book, Utc::now());
        let book = self.repository.save(book).await?;
        tracing::info!("Updated book id={}", id);
        Ok(book)
    }

    /// Apply only the supplied fields to an existing book
    pub async fn patch_book(&self, id: i64, patch: &BookPatch) -> AppResult<Book> {
        let mut book = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::book_not_found(id))?;

        patch.merge_into(&mut book, Utc::now());
        let book = self.repository.save(book).await?;
        tracing::debug!("Patched book id={}", id);
        Ok(book)
    }

    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        if !self.repository.exists_by_id(id).await? {
            return Err(AppError::book_not_found(id));
        }
        self.repository.delete_by_id(id).await?;
        tracing::info!("Deleted book id={}", id);
        Ok(())
    }

    pub async fn book_exists(&self, id: i64) -> AppResult<bool> {
        self.repository.exists_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockBookRepository;
    use mockall::predicate::eq;
    use chrono::{DateTime, TimeZone};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn stocked_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
    }

    fn gatsby() -> Book {
        let now = stocked_at();
        Book {
            id: Some(1),
            title: "The Great Gatsby".to_string(),
            author: "F. Scott Fitzgerald".to_string(),
            isbn: Some("978-0-7432-7356-5".to_string()),
            price: Some(Decimal::from_str("12.99").unwrap()),
            quantity: 50,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    fn mockingbird() -> Book {
        Book {
            id: Some(2),
            title: "To Kill a Mockingbird".to_string(),
            author: "Harper Lee".to_string(),
            isbn: Some("978-0-06-112008-4".to_string()),
            price: Some(Decimal::from_str("14.99").unwrap()),
            quantity: 30,
            created_at: None,
            updated_at: None,
        }
    }

    fn input(title: &str, author: &str, isbn: Option<&str>) -> BookInput {
        BookInput {
            title: title.to_string(),
            author: author.to_string(),
            isbn: isbn.map(String::from),
            price: Some(Decimal::from_str("10.99").unwrap()),
            quantity: 25,
        }
    }

    fn service(mock: MockBookRepository) -> BooksService {
        BooksService::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_get_all_books() {
        let mut mock = MockBookRepository::new();
        mock.expect_find_all()
            .times(1)
            .returning(|| Ok(vec![gatsby(), mockingbird()]));

        let books = service(mock).get_all_books().await.unwrap();
        assert_eq!(books.len(), 2);
    }

    #[tokio::test]
    async fn test_get_book_by_id_present_and_absent() {
        let mut mock = MockBookRepository::new();
        mock.expect_find_by_id()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(Some(gatsby())));
        mock.expect_find_by_id()
            .with(eq(999))
            .times(1)
            .returning(|_| Ok(None));
        let service = service(mock);

        let found = service.get_book_by_id(1).await.unwrap().unwrap();
        assert_eq!(found.title, "The Great Gatsby");
        assert!(service.get_book_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_by_isbn_author_and_title_delegate() {
        let mut mock = MockBookRepository::new();
        mock.expect_find_by_isbn()
            .with(eq("978-0-7432-7356-5"))
            .times(1)
            .returning(|_| Ok(Some(gatsby())));
        mock.expect_find_by_author()
            .with(eq("F. Scott Fitzgerald"))
            .times(1)
            .returning(|_| Ok(vec![gatsby()]));
        mock.expect_find_by_title_containing()
            .with(eq("Gatsby"))
            .times(1)
            .returning(|_| Ok(vec![gatsby()]));
        let service = service(mock);

        let by_isbn = service.get_book_by_isbn("978-0-7432-7356-5").await.unwrap();
        assert_eq!(by_isbn.unwrap().isbn.as_deref(), Some("978-0-7432-7356-5"));

        let by_author = service.get_books_by_author("F. Scott Fitzgerald").await.unwrap();
        assert_eq!(by_author[0].author, "F. Scott Fitzgerald");

        let by_title = service.search_books_by_title("Gatsby").await.unwrap();
        assert!(by_title[0].title.contains("Gatsby"));
    }

    #[tokio::test]
    async fn test_create_book_with_fresh_isbn() {
        let mut mock = MockBookRepository::new();
        mock.expect_find_by_isbn()
            .with(eq("978-0-452-28423-4"))
            .times(1)
            .returning(|_| Ok(None));
        mock.expect_save().times(1).returning(|mut book| {
            assert!(book.id.is_none());
            book.id = Some(1);
            Ok(book)
        });

        let created = service(mock)
            .create_book(&input("1984", "George Orwell", Some("978-0-452-28423-4")))
            .await
            .unwrap();

        assert_eq!(created.id, Some(1));
        assert_eq!(created.title, "1984");
        assert!(created.created_at.is_some());
        assert_eq!(created.created_at, created.updated_at);
    }

    #[tokio::test]
    async fn test_create_book_with_duplicate_isbn_does_not_write() {
        let mut mock = MockBookRepository::new();
        mock.expect_find_by_isbn()
            .with(eq("978-0-7432-7356-5"))
            .times(1)
            .returning(|_| Ok(Some(gatsby())));
        mock.expect_save().never();

        let err = service(mock)
            .create_book(&input("Copy", "Someone", Some("978-0-7432-7356-5")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::DuplicateIsbn(_)));
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_create_book_without_isbn_skips_lookup() {
        let mut mock = MockBookRepository::new();
        mock.expect_find_by_isbn().never();
        mock.expect_save().times(1).returning(|mut book| {
            book.id = Some(7);
            Ok(book)
        });

        let created = service(mock)
            .create_book(&input("Untitled", "Anonymous", None))
            .await
            .unwrap();
        assert_eq!(created.id, Some(7));
    }

    #[tokio::test]
    async fn test_update_book_replaces_fields() {
        let mut mock = MockBookRepository::new();
        mock.expect_find_by_id()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(Some(gatsby())));
        mock.expect_find_by_isbn().never();
        mock.expect_save().times(1).returning(Ok);

        let mut data = input("Updated Title", "F. Scott Fitzgerald", Some("978-0-7432-7356-5"));
        data.price = Some(Decimal::from_str("15.99").unwrap());
        data.quantity = 100;
        let updated = service(mock).update_book(1, &data).await.unwrap();

        assert_eq!(updated.title, "Updated Title");
        assert_eq!(updated.price, Some(Decimal::from_str("15.99").unwrap()));
        assert_eq!(updated.quantity, 100);
        assert_eq!(updated.id, Some(1));
        assert_eq!(updated.created_at, Some(stocked_at()));
        assert!(updated.updated_at > Some(stocked_at()));
    }

    #[tokio::test]
    async fn test_update_missing_book_is_not_found() {
        let mut mock = MockBookRepository::new();
        mock.expect_find_by_id()
            .with(eq(999))
            .times(1)
            .returning(|_| Ok(None));
        mock.expect_save().never();

        let err = service(mock)
            .update_book(999, &input("T", "A", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_update_to_isbn_of_other_book_is_rejected() {
        let mut mock = MockBookRepository::new();
        mock.expect_find_by_id()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(Some(gatsby())));
        mock.expect_find_by_isbn()
            .with(eq("978-0-06-112008-4"))
            .times(1)
            .returning(|_| Ok(Some(mockingbird())));
        mock.expect_save().never();

        let err = service(mock)
            .update_book(1, &input("T", "A", Some("978-0-06-112008-4")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateIsbn(_)));
    }

    #[tokio::test]
    async fn test_update_to_new_unused_isbn() {
        let mut mock = MockBookRepository::new();
        mock.expect_find_by_id()
            .returning(|_| Ok(Some(gatsby())));
        mock.expect_find_by_isbn()
            .with(eq("978-1-111-11111-1"))
            .times(1)
            .returning(|_| Ok(None));
        mock.expect_save().times(1).returning(Ok);

        let updated = service(mock)
            .update_book(1, &input("T", "A", Some("978-1-111-11111-1")))
            .await
            .unwrap();
        assert_eq!(updated.isbn.as_deref(), Some("978-1-111-11111-1"));
    }

    #[tokio::test]
    async fn test_patch_only_price() {
        let original = gatsby();
        let mut mock = MockBookRepository::new();
        mock.expect_find_by_id()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(Some(gatsby())));
        mock.expect_save().times(1).returning(Ok);

        let patch = BookPatch {
            price: Some(Decimal::from_str("20.00").unwrap()),
            ..Default::default()
        };
        let patched = service(mock).patch_book(1, &patch).await.unwrap();

        assert_eq!(patched.price, Some(Decimal::from(20)));
        assert_eq!(patched.title, "The Great Gatsby");
        assert_eq!(patched.author, original.author);
        assert_eq!(patched.isbn, original.isbn);
        assert_eq!(patched.quantity, 50);
        assert_eq!(patched.created_at, Some(stocked_at()));
        assert!(patched.updated_at > Some(stocked_at()));
    }

    #[tokio::test]
    async fn test_patch_missing_book_is_not_found() {
        let mut mock = MockBookRepository::new();
        mock.expect_find_by_id().returning(|_| Ok(None));
        mock.expect_save().never();

        let err = service(mock)
            .patch_book(5, &BookPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_patch_to_taken_isbn_surfaces_store_conflict() {
        let mut mock = MockBookRepository::new();
        mock.expect_find_by_id()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(Some(gatsby())));
        mock.expect_find_by_isbn().never();
        mock.expect_save()
            .times(1)
            .returning(|book| Err(AppError::duplicate_isbn(book.isbn.as_deref().unwrap_or_default())));

        let patch = BookPatch {
            isbn: Some("978-0-06-112008-4".to_string()),
            ..Default::default()
        };
        let err = service(mock).patch_book(1, &patch).await.unwrap_err();

        assert!(matches!(err, AppError::DuplicateIsbn(_)));
        assert!(err.to_string().contains("978-0-06-112008-4"));
    }

    #[tokio::test]
    async fn test_delete_existing_book() {
        let mut mock = MockBookRepository::new();
        mock.expect_exists_by_id()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(true));
        mock.expect_delete_by_id()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(()));

        service(mock).delete_book(1).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_book_is_not_found() {
        let mut mock = MockBookRepository::new();
        mock.expect_exists_by_id()
            .with(eq(999))
            .times(1)
            .returning(|_| Ok(false));
        mock.expect_delete_by_id().never();

        let err = service(mock).delete_book(999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_book_exists() {
        let mut mock = MockBookRepository::new();
        mock.expect_exists_by_id()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(true));

        assert!(service(mock).book_exists(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_books_routes_by_filter_and_window() {
        let mut mock = MockBookRepository::new();
        mock.expect_find_all_windowed()
            .with(eq(Window { limit: 10, offset: 10 }))
            .times(1)
            .returning(|_| Ok(vec![]));
        mock.expect_find_by_author()
            .with(eq("Harper Lee"))
            .times(1)
            .returning(|_| Ok(vec![gatsby(), mockingbird()]));
        let service = service(mock);

        let paged = BookQuery {
            page: Some(2),
            per_page: Some(10),
            ..Default::default()
        };
        assert!(service.list_books(&paged).await.unwrap().is_empty());

        let by_author = BookQuery {
            author: Some("Harper Lee".to_string()),
            page: Some(2),
            per_page: Some(1),
            ..Default::default()
        };
        let books = service.list_books(&by_author).await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, Some(2));
    }
}
