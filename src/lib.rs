//! Bookstore Inventory Server
//!
//! A REST JSON API for managing a bookstore inventory: books with unique
//! ISBNs, full and partial updates, and lookups by id, ISBN, author and
//! title.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<services::Services>,
}
