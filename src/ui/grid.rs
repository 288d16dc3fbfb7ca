//! Results grid.

use comfy_table::{Attribute, Cell, CellAlignment, Table};

use super::{format_number, truncate_with_ellipsis};
use crate::image::ImageSlot;
use crate::models::MediaItem;

/// Where the row's image is shown from: the slot's current source, or the
/// item's own URL when no slot is tracked for it
fn image_location(item: &MediaItem, slot: Option<&ImageSlot>) -> String {
    slot.map(|s| s.source().location())
        .unwrap_or_else(|| item.image.clone())
}

/// Build the results table, sized for a terminal `width` columns wide.
///
/// `images` holds the image slot of each item, aligned with `items`. Rows
/// are numbered from `offset + 1` so the numbers can be passed to
/// `open <n>` even when only a later page is shown.
pub fn results_table(
    items: &[MediaItem],
    images: &[ImageSlot],
    offset: usize,
    width: usize,
) -> Table {
    let title_width = (width / 3).clamp(20, 60);
    let image_width = (width / 4).clamp(16, 50);

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["#", "Title", "Photographer", "Date", "Size", "Image"]);

    for (index, item) in items.iter().enumerate() {
        let meta = &item.metadata;
        table.add_row(vec![
            Cell::new(offset + index + 1).set_alignment(CellAlignment::Right),
            Cell::new(truncate_with_ellipsis(&item.title, title_width))
                .add_attribute(Attribute::Bold),
            Cell::new(
                meta.photographer
                    .as_deref()
                    .map(|p| truncate_with_ellipsis(p, 24))
                    .unwrap_or_default(),
            ),
            Cell::new(meta.display_date().unwrap_or_default()),
            Cell::new(meta.dimensions().unwrap_or_default()),
            Cell::new(truncate_with_ellipsis(
                &image_location(item, images.get(index)),
                image_width,
            )),
        ]);
    }
    table
}

/// Line-per-item rendering for pipes and plain output.
pub fn render_plain(items: &[MediaItem], images: &[ImageSlot]) -> String {
    let mut out = String::new();
    for (index, item) in items.iter().enumerate() {
        out.push_str(&format!("{}. {}", index + 1, item.title));
        if let Some(photographer) = &item.metadata.photographer {
            out.push_str(&format!(" - {}", photographer));
        }
        out.push('\n');
        out.push_str(&format!(
            "   Image: {}\n",
            image_location(item, images.get(index))
        ));
        if let Some(date) = item.metadata.display_date() {
            out.push_str(&format!("   Date: {}\n", date));
        }
    }
    out
}

/// "Showing 24 of 50 results"
pub fn results_summary(shown: usize, total: usize) -> String {
    if total == 0 {
        return "No results".to_string();
    }
    format!(
        "Showing {} of {} results",
        format_number(shown),
        format_number(total)
    )
}
