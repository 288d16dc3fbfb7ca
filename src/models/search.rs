//! Search filter and paging models.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Query value meaning "match all documents"
pub const WILDCARD_QUERY: &str = "*";

/// Page size used when none is configured
pub const DEFAULT_PAGE_SIZE: u32 = 12;

fn wildcard() -> String {
    WILDCARD_QUERY.to_string()
}

/// The set of filters a user wants matched.
///
/// Values are kept as typed by the user; [`crate::validate::validate_filters`]
/// decides whether they are acceptable and the API client normalizes them
/// before transmission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Keyword query (`*` matches everything)
    #[serde(default = "wildcard")]
    pub query: String,

    /// Photographer name filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photographer: Option<String>,

    /// Lower bound of the date range (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_date: Option<String>,

    /// Upper bound of the date range (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_date: Option<String>,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            query: wildcard(),
            photographer: None,
            from_date: None,
            to_date: None,
        }
    }
}

impl SearchFilters {
    /// Create filters for a keyword query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set photographer filter
    pub fn photographer(mut self, photographer: impl Into<String>) -> Self {
        self.photographer = Some(photographer.into());
        self
    }

    /// Set start of the date range
    pub fn from_date(mut self, date: impl Into<String>) -> Self {
        self.from_date = Some(date.into());
        self
    }

    /// Set end of the date range
    pub fn to_date(mut self, date: impl Into<String>) -> Self {
        self.to_date = Some(date.into());
        self
    }

    /// Set a single field from form input.
    ///
    /// An empty value clears an optional field; the query keeps whatever was
    /// typed, including the empty string.
    pub fn set(&mut self, field: FilterField, value: impl Into<String>) {
        let value = value.into();
        let optional = if value.is_empty() { None } else { Some(value.clone()) };
        match field {
            FilterField::Query => self.query = value,
            FilterField::Photographer => self.photographer = optional,
            FilterField::FromDate => self.from_date = optional,
            FilterField::ToDate => self.to_date = optional,
        }
    }

    /// Reset a single field to its default
    pub fn clear(&mut self, field: FilterField) {
        match field {
            FilterField::Query => self.query = wildcard(),
            FilterField::Photographer => self.photographer = None,
            FilterField::FromDate => self.from_date = None,
            FilterField::ToDate => self.to_date = None,
        }
    }

    /// Current value of a field, if any
    pub fn get(&self, field: FilterField) -> Option<&str> {
        match field {
            FilterField::Query => Some(self.query.as_str()),
            FilterField::Photographer => self.photographer.as_deref(),
            FilterField::FromDate => self.from_date.as_deref(),
            FilterField::ToDate => self.to_date.as_deref(),
        }
    }
}

/// Editable fields of the search form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Query,
    Photographer,
    FromDate,
    ToDate,
}

impl FilterField {
    /// All fields in form order
    pub const ALL: [FilterField; 4] = [
        FilterField::Query,
        FilterField::Photographer,
        FilterField::FromDate,
        FilterField::ToDate,
    ];

    /// Wire/parameter name of the field
    pub fn name(&self) -> &'static str {
        match self {
            FilterField::Query => "query",
            FilterField::Photographer => "photographer",
            FilterField::FromDate => "from_date",
            FilterField::ToDate => "to_date",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FilterField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "query" | "q" | "keyword" => Ok(FilterField::Query),
            "photographer" | "p" | "by" => Ok(FilterField::Photographer),
            "from" | "from_date" | "since" => Ok(FilterField::FromDate),
            "to" | "to_date" | "until" => Ok(FilterField::ToDate),
            other => Err(format!("unknown field: {}", other)),
        }
    }
}

/// Offset/limit of a results page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,

    /// Items per page
    pub size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Create a page request, clamping page and size to at least 1
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size: size.max(1),
        }
    }

    /// First page with the given size
    pub fn first(size: u32) -> Self {
        Self::new(1, size)
    }

    /// The page after this one
    pub fn next(self) -> Self {
        Self::new(self.page.saturating_add(1), self.size)
    }
}

/// Parse a user or server supplied date into a calendar date.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, RFC 3339 timestamps and naive
/// `YYYY-MM-DDTHH:MM:SS` timestamps.
pub fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(input, fmt) {
            return Some(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, fmt) {
            return Some(dt.date());
        }
    }

    None
}
