//! Core data models for media items and search operations.

mod media;
mod search;

pub use media::{MediaItem, MediaMetadata, SearchResultPage};
pub use search::{
    parse_calendar_date, FilterField, PageRequest, SearchFilters, DEFAULT_PAGE_SIZE,
    WILDCARD_QUERY,
};
