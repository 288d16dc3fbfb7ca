//! Image loading with a local placeholder fallback.
//!
//! A result grid must never show a broken image. [`ImageSlot`] models the
//! source swap for a single image: the first load error replaces the remote
//! URL with the placeholder, any later error is ignored. [`ImageLoader`]
//! applies the same rule to real HTTP fetches.

use std::io::Cursor;
use std::path::PathBuf;

use crate::models::MediaItem;
use crate::utils::HttpClient;

/// Placeholder shipped with the front-end
pub const DEFAULT_PLACEHOLDER_PATH: &str = "public/placeholder-image.jpg";

/// Where an image is currently being shown from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Remote(String),
    Placeholder(PathBuf),
}

impl ImageSource {
    /// Display form of the source
    pub fn location(&self) -> String {
        match self {
            ImageSource::Remote(url) => url.clone(),
            ImageSource::Placeholder(path) => path.display().to_string(),
        }
    }
}

/// Source state of a single rendered image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlot {
    source: ImageSource,
    placeholder: PathBuf,
}

impl ImageSlot {
    pub fn new(url: impl Into<String>, placeholder: impl Into<PathBuf>) -> Self {
        Self {
            source: ImageSource::Remote(url.into()),
            placeholder: placeholder.into(),
        }
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.source, ImageSource::Placeholder(_))
    }

    /// Report a load error for the current source.
    ///
    /// Returns true if the source was swapped to the placeholder. Once the
    /// placeholder is showing, further errors change nothing.
    pub fn on_error(&mut self) -> bool {
        if self.is_placeholder() {
            return false;
        }
        self.source = ImageSource::Placeholder(self.placeholder.clone());
        true
    }
}

/// One [`ImageSlot`] per result, in result order.
///
/// [`ImageSlots::sync`] keeps the slots in step with a growing result list:
/// slots of items that are still in place keep their fallback state, items
/// that changed get a fresh slot.
#[derive(Debug, Clone)]
pub struct ImageSlots {
    placeholder: PathBuf,
    keys: Vec<(String, String)>,
    slots: Vec<ImageSlot>,
}

impl ImageSlots {
    pub fn new(placeholder: impl Into<PathBuf>) -> Self {
        Self {
            placeholder: placeholder.into(),
            keys: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// Match the slots to `items`
    pub fn sync(&mut self, items: &[MediaItem]) {
        let kept = self
            .keys
            .iter()
            .zip(items)
            .take_while(|((id, url), item)| *id == item.id && *url == item.image)
            .count();
        self.keys.truncate(kept);
        self.slots.truncate(kept);

        for item in &items[kept..] {
            self.keys.push((item.id.clone(), item.image.clone()));
            self.slots
                .push(ImageSlot::new(item.image.clone(), self.placeholder.clone()));
        }
    }

    pub fn as_slice(&self) -> &[ImageSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Report a load error for the image at `index`, see [`ImageSlot::on_error`]
    pub fn report_error(&mut self, index: usize) -> bool {
        self.slots
            .get_mut(index)
            .map(ImageSlot::on_error)
            .unwrap_or(false)
    }
}

/// Errors while loading an image
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Failed to fetch image: {0}")]
    Fetch(String),

    #[error("Image request returned status {0}")]
    Status(u16),

    #[error("Image could not be decoded: {0}")]
    Decode(String),

    #[error("Placeholder image {} is unreadable: {source}", .path.display())]
    Placeholder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Image bytes together with where they came from
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub source: ImageSource,
    pub bytes: Vec<u8>,
    /// Remote failure that caused the fallback, if any
    pub fallback_reason: Option<String>,
}

impl LoadedImage {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.source, ImageSource::Placeholder(_))
    }
}

/// Fetches remote images, substituting the placeholder on any failure
#[derive(Debug, Clone)]
pub struct ImageLoader {
    client: HttpClient,
    placeholder: PathBuf,
}

impl ImageLoader {
    pub fn new(client: HttpClient, placeholder: impl Into<PathBuf>) -> Self {
        Self {
            client,
            placeholder: placeholder.into(),
        }
    }

    /// Load `url`, falling back to the placeholder exactly once.
    ///
    /// Only an unreadable placeholder is reported as an error.
    pub async fn load(&self, url: &str) -> Result<LoadedImage, ImageError> {
        let mut slot = ImageSlot::new(url, &self.placeholder);

        let reason = match self.fetch_remote(url).await {
            Ok(bytes) => {
                return Ok(LoadedImage {
                    source: slot.source().clone(),
                    bytes,
                    fallback_reason: None,
                })
            }
            Err(e) => e.to_string(),
        };

        slot.on_error();
        tracing::warn!(url, reason = %reason, placeholder = %self.placeholder.display(), "Image failed to load, using placeholder");

        let bytes = tokio::fs::read(&self.placeholder)
            .await
            .map_err(|source| ImageError::Placeholder {
                path: self.placeholder.clone(),
                source,
            })?;

        Ok(LoadedImage {
            source: slot.source().clone(),
            bytes,
            fallback_reason: Some(reason),
        })
    }

    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let response = self
            .client
            .client()
            .get(url)
            .send()
            .await
            .map_err(|e| ImageError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ImageError::Status(response.status().as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageError::Fetch(e.to_string()))?;

        check_decodes(&bytes)?;
        Ok(bytes.to_vec())
    }
}

/// Verify that `bytes` hold a decodable image
pub fn check_decodes(bytes: &[u8]) -> Result<(), ImageError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(e.to_string()))?
        .decode()
        .map(|_| ())
        .map_err(|e| ImageError::Decode(e.to_string()))
}
