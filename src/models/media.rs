//! Media item model representing one archive hit.

use serde::{Deserialize, Deserializer, Serialize};

use super::search::parse_calendar_date;

/// Pixel dimension sent as any JSON number; `1200.0` and `799.6` round to
/// whole pixels, negative or out-of-range values count as unknown.
fn lenient_dimension<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite() && *v >= 0.0 && *v <= u32::MAX as f64)
        .map(|v| v.round() as u32))
}

/// `null` decodes to the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Descriptive metadata attached to a media item.
///
/// Everything except `image_id` is optional; the archive omits fields it
/// does not know.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Archive-side image identifier
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_id: String,

    /// Capture or publication date as sent by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Photographer credit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photographer: Option<String>,

    /// Pixel width
    #[serde(
        default,
        deserialize_with = "lenient_dimension",
        skip_serializing_if = "Option::is_none"
    )]
    pub width: Option<u32>,

    /// Pixel height
    #[serde(
        default,
        deserialize_with = "lenient_dimension",
        skip_serializing_if = "Option::is_none"
    )]
    pub height: Option<u32>,

    /// Copyright notice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
}

impl MediaMetadata {
    /// Dimensions as `WIDTHxHEIGHT`, if both are known
    pub fn dimensions(&self) -> Option<String> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
            _ => None,
        }
    }

    /// The date rendered as a calendar date (e.g. "March 5, 2021").
    ///
    /// Falls back to the raw server value when it does not parse.
    pub fn display_date(&self) -> Option<String> {
        let raw = self.date.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        Some(
            parse_calendar_date(raw)
                .map(|d| d.format("%B %-d, %Y").to_string())
                .unwrap_or_else(|| raw.to_string()),
        )
    }
}

/// A single media item from the archive.
///
/// Items are never modified after they are received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Opaque identifier
    pub id: String,

    /// Caption/title
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    /// Remote image URL
    pub image: String,

    /// Descriptive metadata
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: MediaMetadata,
}

impl MediaItem {
    /// Create a new item with required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>, image: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            metadata: MediaMetadata {
                image_id: id.clone(),
                ..Default::default()
            },
            id,
            title: title.into(),
            image: image.into(),
        }
    }

    /// Set the photographer credit
    pub fn photographer(mut self, photographer: impl Into<String>) -> Self {
        self.metadata.photographer = Some(photographer.into());
        self
    }

    /// Set the date
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.metadata.date = Some(date.into());
        self
    }

    /// Set pixel dimensions
    pub fn dimensions(mut self, width: u32, height: u32) -> Self {
        self.metadata.width = Some(width);
        self.metadata.height = Some(height);
        self
    }

    /// Set the copyright notice
    pub fn copyright(mut self, copyright: impl Into<String>) -> Self {
        self.metadata.copyright = Some(copyright.into());
        self
    }
}

/// One page of search results as returned by the archive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultPage {
    /// Total number of matches available on the server
    pub count: usize,

    /// Items on this page, in server order
    #[serde(default)]
    pub results: Vec<MediaItem>,

    /// Next page number, if the server reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<u32>,
}

impl SearchResultPage {
    /// Create a page
    pub fn new(count: usize, results: Vec<MediaItem>) -> Self {
        Self {
            count,
            results,
            next_page: None,
        }
    }

    /// Set the next page hint
    pub fn next_page(mut self, page: u32) -> Self {
        self.next_page = Some(page);
        self
    }
}
