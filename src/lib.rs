//! # Media Explorer
//!
//! A terminal front-end for searching a media archive by keyword,
//! photographer and date range.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (MediaItem, SearchFilters, etc.)
//! - [`api`]: Search API client behind the [`SearchBackend`] trait
//! - [`validate`]: Field validation that gates a search
//! - [`session`]: Search and pagination controller
//! - [`image`]: Image loading with placeholder fallback
//! - [`ui`]: Results grid, detail overlay and terminal output
//! - [`utils`]: HTTP client
//! - [`config`]: Configuration management

pub mod api;
pub mod config;
pub mod image;
pub mod models;
pub mod session;
pub mod ui;
pub mod utils;
pub mod validate;

// Re-export commonly used types
pub use api::{ApiClient, ApiError, SearchBackend};
pub use models::{MediaItem, SearchFilters, SearchResultPage};
pub use session::SearchSession;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
