//! Detail view for a single result.

use std::path::PathBuf;

use super::truncate_with_ellipsis;
use crate::image::{ImageSlot, ImageSource};
use crate::models::MediaItem;

/// Shows one selected result with its full metadata.
///
/// The overlay only holds a copy of the selected item; it never reads or
/// changes the search session.
#[derive(Debug, Clone)]
pub struct DetailOverlay {
    current: Option<MediaItem>,
    image: Option<ImageSlot>,
    placeholder: PathBuf,
}

impl DetailOverlay {
    pub fn new(placeholder: impl Into<PathBuf>) -> Self {
        Self {
            current: None,
            image: None,
            placeholder: placeholder.into(),
        }
    }

    /// Show `item`, replacing whatever was open.
    pub fn open(&mut self, item: MediaItem) {
        tracing::debug!(id = %item.id, "Opening detail view");
        self.image = Some(ImageSlot::new(item.image.clone(), self.placeholder.clone()));
        self.current = Some(item);
    }

    pub fn close(&mut self) {
        self.current = None;
        self.image = None;
    }

    pub fn current(&self) -> Option<&MediaItem> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Source the enlarged image is shown from
    pub fn image_source(&self) -> Option<&ImageSource> {
        self.image.as_ref().map(|slot| slot.source())
    }

    /// Report that the enlarged image failed to load.
    ///
    /// Returns true if the placeholder was swapped in.
    pub fn report_image_error(&mut self) -> bool {
        self.image.as_mut().map(ImageSlot::on_error).unwrap_or(false)
    }

    /// Label/value pairs for the open item. Missing metadata is skipped.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let Some(item) = &self.current else {
            return Vec::new();
        };
        let meta = &item.metadata;

        let mut fields = vec![("Title", item.title.clone())];
        if let Some(photographer) = &meta.photographer {
            fields.push(("Photographer", format!("By {}", photographer)));
        }
        if let Some(date) = meta.display_date() {
            fields.push(("Date", date));
        }
        if let Some(dimensions) = meta.dimensions() {
            fields.push(("Dimensions", dimensions));
        }
        if let Some(copyright) = &meta.copyright {
            fields.push(("Copyright", copyright.clone()));
        }
        fields.push(("Image ID", meta.image_id.clone()));
        if let Some(source) = self.image_source() {
            fields.push(("Image", source.location()));
        }
        fields
    }

    /// Render the open item as a box `width` columns wide.
    pub fn render(&self, width: usize) -> Option<String> {
        self.current.as_ref()?;

        let inner = width.clamp(40, 100) - 4;
        let label_width = 14;
        let value_width = inner - label_width;

        let mut out = String::new();
        out.push_str(&format!("┌{}┐\n", "─".repeat(inner + 2)));
        for (label, value) in self.fields() {
            let value = truncate_with_ellipsis(&value, value_width);
            let pad = value_width.saturating_sub(unicode_width::UnicodeWidthStr::width(value.as_str()));
            out.push_str(&format!(
                "│ {:<label_width$}{}{} │\n",
                label,
                value,
                " ".repeat(pad)
            ));
        }
        out.push_str(&format!("└{}┘\n", "─".repeat(inner + 2)));
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> MediaItem {
        MediaItem::new(id, format!("Photo {}", id), format!("https://img.example/{}.jpg", id))
            .photographer("Jane Doe")
            .date("2021-03-05")
            .dimensions(800, 600)
            .copyright("Archive Trust")
    }

    #[test]
    fn test_open_replace_close() {
        let mut overlay = DetailOverlay::new("placeholder.jpg");
        assert!(!overlay.is_open());
        assert!(overlay.render(80).is_none());

        overlay.open(item("a"));
        assert_eq!(overlay.current().map(|i| i.id.as_str()), Some("a"));

        overlay.open(item("b"));
        assert_eq!(overlay.current().map(|i| i.id.as_str()), Some("b"));

        overlay.close();
        assert!(overlay.current().is_none());
        assert!(overlay.image_source().is_none());
    }

    #[test]
    fn test_fields_show_all_metadata() {
        let mut overlay = DetailOverlay::new("placeholder.jpg");
        overlay.open(item("a"));

        let fields = overlay.fields();
        let get = |label: &str| {
            fields
                .iter()
                .find(|(l, _)| *l == label)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("Title"), Some("Photo a"));
        assert_eq!(get("Photographer"), Some("By Jane Doe"));
        assert_eq!(get("Date"), Some("March 5, 2021"));
        assert_eq!(get("Dimensions"), Some("800x600"));
        assert_eq!(get("Copyright"), Some("Archive Trust"));
        assert_eq!(get("Image ID"), Some("a"));
        assert_eq!(get("Image"), Some("https://img.example/a.jpg"));
    }

    #[test]
    fn test_missing_metadata_is_skipped() {
        let mut overlay = DetailOverlay::new("placeholder.jpg");
        overlay.open(MediaItem::new("x", "Bare", "https://img.example/x.jpg"));

        let labels: Vec<&str> = overlay.fields().iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec!["Title", "Image ID", "Image"]);
    }

    #[test]
    fn test_image_error_swaps_once() {
        let mut overlay = DetailOverlay::new("placeholder.jpg");
        overlay.open(item("a"));

        assert!(overlay.report_image_error());
        assert!(!overlay.report_image_error());
        assert_eq!(
            overlay.image_source(),
            Some(&ImageSource::Placeholder(PathBuf::from("placeholder.jpg")))
        );

        // a newly opened item starts from its remote image again
        overlay.open(item("b"));
        assert_eq!(
            overlay.image_source(),
            Some(&ImageSource::Remote("https://img.example/b.jpg".into()))
        );
    }

    #[test]
    fn test_render_box() {
        let mut overlay = DetailOverlay::new("placeholder.jpg");
        overlay.open(item("a"));

        let rendered = overlay.render(80).unwrap();
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].starts_with('┌'));
        assert!(lines.last().unwrap().starts_with('└'));
        assert!(rendered.contains("By Jane Doe"));

        let widths: Vec<usize> = lines
            .iter()
            .map(|l| unicode_width::UnicodeWidthStr::width(*l))
            .collect();
        assert!(widths.iter().all(|w| *w == widths[0]));
    }
}
