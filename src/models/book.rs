//! Book model and request payloads

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Book record as stored in the inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Assigned by the store on first save
    pub id: Option<i64>,
    pub title: String,
    pub author: String,
    /// Unique across all books when present
    pub isbn: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>, example = 10.99)]
    pub price: Option<Decimal>,
    pub quantity: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create or full-update request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, max = 20, message = "ISBN must be 1 to 20 characters"))]
    pub isbn: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
}

/// Partial update request; only supplied fields are applied
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct BookPatch {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author cannot be empty"))]
    pub author: Option<String>,
    #[validate(length(min = 1, max = 20, message = "ISBN must be 1 to 20 characters"))]
    pub isbn: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
}

/// Book list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Exact ISBN
    pub isbn: Option<String>,
    /// Exact author name
    pub author: Option<String>,
    /// Substring of the title
    pub title: Option<String>,
    /// Page number, starting at 1
    pub page: Option<i64>,
    /// Books per page (default: 20, max: 100)
    pub per_page: Option<i64>,
}

/// Largest value a `DECIMAL(10,2)` price column holds
pub const MAX_PRICE: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, 2);

fn check_price(price: Option<Decimal>) -> AppResult<()> {
    match price {
        Some(p) if p < Decimal::ZERO => {
            Err(AppError::Validation("price: Price cannot be negative".to_string()))
        }
        Some(p) if p.round_dp(2) > MAX_PRICE => Err(AppError::Validation(format!(
            "price: Price cannot exceed {}",
            MAX_PRICE
        ))),
        _ => Ok(()),
    }
}

/// Prices are kept with two fractional digits
pub fn normalize_price(price: Option<Decimal>) -> Option<Decimal> {
    price.map(|p| p.round_dp(2))
}

impl BookInput {
    /// Run field validation, including the price sign check
    pub fn check(&self) -> AppResult<()> {
        self.validate()?;
        check_price(self.price)
    }

    /// Build an unsaved book from this input
    pub fn to_new_book(&self, now: DateTime<Utc>) -> Book {
        Book {
            id: None,
            title: self.title.clone(),
            author: self.author.clone(),
            isbn: self.isbn.clone(),
            price: normalize_price(self.price),
            quantity: self.quantity,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Replace every mutable field of `book`; id and created_at are kept
    pub fn replace_into(&self, book: &mut Book, now: DateTime<Utc>) {
        book.title = self.title.clone();
        book.author = self.author.clone();
        book.isbn = self.isbn.clone();
        book.price = normalize_price(self.price);
        book.quantity = self.quantity;
        book.updated_at = Some(now);
    }
}

impl BookPatch {
    pub fn check(&self) -> AppResult<()> {
        self.validate()?;
        check_price(self.price)
    }

    /// Merge supplied fields onto `book`
    pub fn merge_into(&self, book: &mut Book, now: DateTime<Utc>) {
        if let Some(ref title) = self.title {
            book.title = title.clone();
        }
        if let Some(ref author) = self.author {
            book.author = author.clone();
        }
        if let Some(ref isbn) = self.isbn {
            book.isbn = Some(isbn.clone());
        }
        if let Some(price) = self.price {
            book.price = Some(price.round_dp(2));
        }
        if let Some(quantity) = self.quantity {
            book.quantity = quantity;
        }
        book.updated_at = Some(now);
    }
}
