//! Field validation for the search form.
//!
//! A search may only run when [`validate_filters`] reports no errors. The
//! result is keyed by field so a front-end can show each message next to the
//! input it belongs to.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::models::{parse_calendar_date, SearchFilters};

/// Minimum number of characters in a photographer filter
pub const MIN_PHOTOGRAPHER_LEN: usize = 2;

/// Validation error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Photographer name must be at least 2 characters")]
    PhotographerTooShort,

    #[error("Invalid start date")]
    InvalidFromDate,

    #[error("Invalid end date")]
    InvalidToDate,

    #[error("End date must be after start date")]
    InvertedDateRange,
}

impl ValidationError {
    /// The form field this error is reported against
    pub fn field(&self) -> ErrorField {
        match self {
            ValidationError::PhotographerTooShort => ErrorField::Photographer,
            ValidationError::InvalidFromDate => ErrorField::FromDate,
            ValidationError::InvalidToDate => ErrorField::ToDate,
            ValidationError::InvertedDateRange => ErrorField::Dates,
        }
    }
}

/// Keys under which validation errors are reported.
///
/// `Dates` is the combined range check, kept apart from the per-date checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorField {
    Photographer,
    FromDate,
    ToDate,
    Dates,
}

impl ErrorField {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorField::Photographer => "photographer",
            ErrorField::FromDate => "from_date",
            ErrorField::ToDate => "to_date",
            ErrorField::Dates => "dates",
        }
    }
}

impl fmt::Display for ErrorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors found in a filter draft, at most one per field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<ErrorField, ValidationError>,
}

impl FieldErrors {
    fn insert(&mut self, error: ValidationError) {
        self.errors.insert(error.field(), error);
    }

    /// True when the draft may be submitted
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Error for a single field
    pub fn get(&self, field: ErrorField) -> Option<&ValidationError> {
        self.errors.get(&field)
    }

    /// Human-readable message for a single field
    pub fn message(&self, field: ErrorField) -> Option<String> {
        self.get(field).map(|e| e.to_string())
    }

    /// Errors in field order
    pub fn iter(&self) -> impl Iterator<Item = (ErrorField, &ValidationError)> {
        self.errors.iter().map(|(k, v)| (*k, v))
    }

    /// Field name to message mapping
    pub fn to_messages(&self) -> BTreeMap<&'static str, String> {
        self.iter().map(|(k, v)| (k.name(), v.to_string())).collect()
    }

    /// First date-related message, the way a single line under the date
    /// inputs would show it
    pub fn date_message(&self) -> Option<String> {
        [ErrorField::FromDate, ErrorField::ToDate, ErrorField::Dates]
            .into_iter()
            .find_map(|f| self.message(f))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, err)| format!("{}: {}", field, err))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Check a filter draft.
///
/// Empty optional fields count as absent. The range check only applies when
/// both dates parse; equal dates are a valid one-day range.
pub fn validate_filters(filters: &SearchFilters) -> FieldErrors {
    let mut errors = FieldErrors::default();

    if let Some(name) = non_empty(&filters.photographer) {
        if name.chars().count() < MIN_PHOTOGRAPHER_LEN {
            errors.insert(ValidationError::PhotographerTooShort);
        }
    }

    let from = non_empty(&filters.from_date).map(parse_calendar_date);
    let to = non_empty(&filters.to_date).map(parse_calendar_date);

    if let Some(None) = from {
        errors.insert(ValidationError::InvalidFromDate);
    }
    if let Some(None) = to {
        errors.insert(ValidationError::InvalidToDate);
    }

    if let (Some(Some(from)), Some(Some(to))) = (from, to) {
        if from > to {
            errors.insert(ValidationError::InvertedDateRange);
        }
    }

    errors
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
