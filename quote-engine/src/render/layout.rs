//! Page geometry for the quote document
//!
//! All positions are in points from the top-left corner of an A4 page.

use quote_pdf::{PageSize, line_height};

pub const PAGE: PageSize = PageSize::A4;
pub const MARGIN: f32 = 40.0;

// === Footer ===

/// Height of the footer box (contact block and page label)
pub const FOOTER_HEIGHT: f32 = 36.0;
/// Space kept clear between content and the footer box
pub const FOOTER_GAP: f32 = 12.0;
/// Space at the bottom of every page that body content may not enter
pub const RESERVED_FOOTER: f32 = FOOTER_HEIGHT + FOOTER_GAP;
pub const FOOTER_FONT_SIZE: f32 = 8.0;

// === Header block ===

pub const BRAND_FONT_SIZE: f32 = 18.0;
pub const TITLE_FONT_SIZE: f32 = 16.0;
pub const LOGO_MAX_WIDTH: f32 = 160.0;
pub const LOGO_MAX_HEIGHT: f32 = 56.0;
pub const PANEL_PADDING: f32 = 8.0;
pub const PANEL_ROW_HEIGHT: f32 = 14.0;
pub const PANEL_LABEL_WIDTH: f32 = 78.0;
pub const PANEL_FONT_SIZE: f32 = 9.0;
/// Space between the header block and the table
pub const HEADER_GAP: f32 = 16.0;

// === Table ===

pub const TABLE_HEADER_HEIGHT: f32 = 22.0;
pub const BODY_FONT_SIZE: f32 = 9.0;
pub const MIN_ROW_HEIGHT: f32 = 20.0;
pub const CELL_PAD_TOP: f32 = 6.0;
pub const CELL_PAD_BOTTOM: f32 = 6.0;
pub const CELL_PAD_X: f32 = 5.0;

// === Totals ===

pub const TOTALS_WIDTH: f32 = 220.0;
pub const TOTALS_ROW_HEIGHT: f32 = 18.0;
pub const TOTALS_PADDING: f32 = 8.0;
pub const TOTALS_GAP: f32 = 14.0;
pub const TOTALS_FONT_SIZE: f32 = 10.0;

pub fn content_width() -> f32 {
    PAGE.width - 2.0 * MARGIN
}

/// Bottom margin edge
pub fn page_bottom() -> f32 {
    PAGE.height - MARGIN
}

/// Lowest y body content may reach
pub fn content_limit() -> f32 {
    page_bottom() - RESERVED_FOOTER
}

/// Whether a block of `height` starting at `top` stays clear of the footer
pub fn fits(top: f32, height: f32) -> bool {
    top + height <= content_limit()
}

/// Metadata panel height for `rows` label/value pairs
pub fn panel_height(rows: usize) -> f32 {
    PANEL_PADDING * 2.0 + rows as f32 * PANEL_ROW_HEIGHT
}

/// Body row height for a cell with `text_lines` wrapped lines
pub fn row_height(text_lines: usize) -> f32 {
    let wrapped = text_lines as f32 * line_height(BODY_FONT_SIZE);
    (wrapped + CELL_PAD_TOP + CELL_PAD_BOTTOM).max(MIN_ROW_HEIGHT)
}

/// Most wrapped lines a row can hold when it starts at `body_top`
pub fn max_row_lines(body_top: f32) -> usize {
    let room = content_limit() - body_top - CELL_PAD_TOP - CELL_PAD_BOTTOM;
    ((room / line_height(BODY_FONT_SIZE)).floor() as usize).max(1)
}

pub fn totals_height() -> f32 {
    TOTALS_PADDING * 2.0 + 3.0 * TOTALS_ROW_HEIGHT
}

/// Scale an image into the logo box, keeping its aspect ratio
pub fn logo_size(aspect_ratio: f32) -> (f32, f32) {
    let width = LOGO_MAX_WIDTH;
    let height = width * aspect_ratio;
    if height <= LOGO_MAX_HEIGHT {
        (width, height)
    } else {
        (LOGO_MAX_HEIGHT / aspect_ratio, LOGO_MAX_HEIGHT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

struct ColumnSpec {
    title: &'static str,
    base_width: f32,
    align: Align,
}

/// Template widths; scaled to the real content width at layout time
const BASE_COLUMNS: [ColumnSpec; 5] = [
    ColumnSpec {
        title: "SKU",
        base_width: 90.0,
        align: Align::Left,
    },
    ColumnSpec {
        title: "Description",
        base_width: 215.0,
        align: Align::Left,
    },
    ColumnSpec {
        title: "Qty",
        base_width: 45.0,
        align: Align::Right,
    },
    ColumnSpec {
        title: "Unit (ex VAT)",
        base_width: 80.0,
        align: Align::Right,
    },
    ColumnSpec {
        title: "Line total",
        base_width: 85.0,
        align: Align::Right,
    },
];

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub title: &'static str,
    pub x: f32,
    pub width: f32,
    pub align: Align,
}

impl Column {
    /// Width available to text inside the cell padding
    pub fn inner_width(&self) -> f32 {
        self.width - 2.0 * CELL_PAD_X
    }

    pub fn text_left(&self) -> f32 {
        self.x + CELL_PAD_X
    }

    pub fn text_right(&self) -> f32 {
        self.x + self.width - CELL_PAD_X
    }
}

/// Table columns spanning exactly `available` points from `left`
///
/// Widths are scaled from the template and floored to 0.01pt; whatever the
/// flooring leaves over goes to the last column.
pub fn columns(left: f32, available: f32) -> Vec<Column> {
    let base_total: f32 = BASE_COLUMNS.iter().map(|c| c.base_width).sum();
    let scale = available / base_total;
    let last = BASE_COLUMNS.len() - 1;

    let mut x = left;
    let mut used = 0.0;
    let mut columns = Vec::with_capacity(BASE_COLUMNS.len());
    for (i, base) in BASE_COLUMNS.iter().enumerate() {
        let width = if i == last {
            available - used
        } else {
            (base.base_width * scale * 100.0).floor() / 100.0
        };
        columns.push(Column {
            title: base.title,
            x,
            width,
            align: base.align,
        });
        x += width;
        used += width;
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_fill_available_width() {
        let cols = columns(MARGIN, content_width());
        assert_eq!(cols.len(), 5);
        let total: f32 = cols.iter().map(|c| c.width).sum();
        assert!((total - content_width()).abs() < 1e-3);

        let last = cols.last().unwrap();
        assert!((last.x + last.width - (MARGIN + content_width())).abs() < 1e-3);
        for pair in cols.windows(2) {
            assert!((pair[0].x + pair[0].width - pair[1].x).abs() < 1e-3);
        }
    }

    #[test]
    fn test_columns_scale_with_width() {
        let narrow = columns(0.0, 257.5);
        // half the template: 90 -> 45
        assert!((narrow[0].width - 45.0).abs() < 0.01);
        let total: f32 = narrow.iter().map(|c| c.width).sum();
        assert!((total - 257.5).abs() < 1e-3);
    }

    #[test]
    fn test_panel_height() {
        assert_eq!(panel_height(0), PANEL_PADDING * 2.0);
        assert_eq!(panel_height(5), PANEL_PADDING * 2.0 + 5.0 * PANEL_ROW_HEIGHT);
    }

    #[test]
    fn test_row_height_has_a_floor() {
        assert!((row_height(1) - 22.8).abs() < 1e-4);
        assert!(row_height(0) >= MIN_ROW_HEIGHT);
        let tall = row_height(6);
        assert!((tall - (6.0 * line_height(BODY_FONT_SIZE) + CELL_PAD_TOP + CELL_PAD_BOTTOM)).abs() < 1e-4);
    }

    #[test]
    fn test_logo_size_keeps_aspect() {
        assert_eq!(logo_size(0.25), (160.0, 40.0));
        let (w, h) = logo_size(1.0);
        assert_eq!(h, LOGO_MAX_HEIGHT);
        assert_eq!(w, LOGO_MAX_HEIGHT);
    }

    #[test]
    fn test_fits_respects_reserved_footer() {
        assert!(fits(content_limit() - 21.0, 20.0));
        assert!(!fits(content_limit() - 19.0, 20.0));
    }
}
