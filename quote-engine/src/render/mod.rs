//! Quote document renderer
//!
//! Lays a quote out as a paginated A4 PDF:
//!
//! 1. Header block (brand mark and metadata panel) at the top of every page
//! 2. Table header row under it
//! 3. Body rows, moved whole to the next page when they would enter the
//!    reserved footer area
//! 4. Totals box, with the same footer check
//! 5. Footer pass over every finished page ("Page X of N")
//!
//! Rendering is synchronous and deterministic: the same quote renders to
//! the same bytes.

pub mod layout;

use crate::money::{Totals, format_money};
use crate::validity::{DisplayStatus, Validity};
use layout::{Align, Column};
use quote_pdf::{
    Font, ImageId, PdfBuilder, PdfError, RasterImage, Rgb, line_height, text_width,
    truncate_to_width, wrap_text,
};
use shared::models::{Quote, QuoteLine};
use std::path::Path;
use tracing::instrument;

const TEXT: Rgb = Rgb(0.13, 0.13, 0.13);
const MUTED: Rgb = Rgb(0.4, 0.4, 0.4);
const RULE: Rgb = Rgb(0.82, 0.82, 0.82);
const HEADER_FILL: Rgb = Rgb(0.2, 0.2, 0.2);
const PANEL_FILL: Rgb = Rgb(0.95, 0.95, 0.95);
const SHADE_FILL: Rgb = Rgb(0.96, 0.96, 0.96);

const DATE_FORMAT: &str = "%d %b %Y";
const TITLE: &str = "QUOTATION";

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Document rendering failed: {0}")]
    Pdf(#[from] PdfError),
}

/// Seller identity printed on every page
#[derive(Debug, Clone)]
pub struct Branding {
    pub name: String,
    pub logo: Option<RasterImage>,
    pub contact_lines: Vec<String>,
    pub currency_symbol: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            name: "Storefront".to_string(),
            logo: None,
            contact_lines: Vec::new(),
            currency_symbol: "£".to_string(),
        }
    }
}

impl Branding {
    /// Load the logo from disk, falling back to the text mark when it
    /// cannot be read
    pub fn with_logo_file(mut self, path: &Path) -> Self {
        match quote_pdf::load_image(path) {
            Ok(logo) => self.logo = Some(logo),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Brand logo unavailable, using text mark");
            }
        }
        self
    }
}

/// Where a body row landed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowPlacement {
    /// 0-based line index
    pub index: usize,
    /// 0-based page index
    pub page: usize,
    pub top: f32,
    pub height: f32,
}

/// Where a block (e.g. the totals box) landed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockPlacement {
    pub page: usize,
    pub top: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub rows: Vec<RowPlacement>,
    pub totals: BlockPlacement,
    pub file_name: String,
}

pub const CONTENT_TYPE: &str = "application/pdf";

pub fn file_name(quote_number: &str) -> String {
    format!("quote-{quote_number}.pdf")
}

#[derive(Debug, Clone, Default)]
pub struct DocumentRenderer {
    branding: Branding,
}

impl DocumentRenderer {
    pub fn new(branding: Branding) -> Self {
        Self { branding }
    }

    pub fn branding(&self) -> &Branding {
        &self.branding
    }

    /// Render a quote; `status_override` replaces the derived status label
    #[instrument(skip_all, fields(quote_number = %quote.quote_number, lines = quote.lines.len()))]
    pub fn render(
        &self,
        quote: &Quote,
        validity: Validity,
        status_override: Option<DisplayStatus>,
    ) -> Result<RenderedDocument, RenderError> {
        let status = status_override.unwrap_or(validity.status);
        let mut composer = Composer::new(&self.branding, metadata(quote, validity, status));

        composer.start_page(true)?;
        let rows = quote
            .lines
            .iter()
            .enumerate()
            .map(|(index, line)| composer.draw_row(index, line))
            .collect::<Result<Vec<_>, _>>()?;
        let totals = composer.draw_totals(Totals::from_subtotal(quote.subtotal_ex_vat))?;
        composer.draw_footers()?;

        let page_count = composer.pdf.page_count();
        let bytes = composer.pdf.build()?;
        tracing::debug!(page_count, bytes = bytes.len(), "Quote document rendered");

        Ok(RenderedDocument {
            bytes,
            page_count,
            rows,
            totals,
            file_name: file_name(&quote.quote_number),
        })
    }
}

/// Metadata panel rows, optional fields only when present
fn metadata(quote: &Quote, validity: Validity, status: DisplayStatus) -> Vec<(&'static str, String)> {
    let mut rows = vec![("Quote no.", quote.quote_number.clone())];
    if let Some(company) = &quote.company {
        rows.push(("Company", company.clone()));
    }
    rows.push(("Customer", quote.email.clone()));
    if let Some(reference) = &quote.reference {
        rows.push(("Reference", reference.clone()));
    }
    if quote.revision > 0 {
        rows.push(("Revision", quote.revision.to_string()));
    }
    rows.push(("Quote date", quote.quote_date.format(DATE_FORMAT).to_string()));
    rows.push(("Valid until", validity.valid_until.format(DATE_FORMAT).to_string()));
    rows.push(("Status", status.label().to_string()));
    rows
}

/// Shorten `line` so that `line...` fits in `max_width`
fn ellipsize(line: &str, font: Font, size: f32, max_width: f32) -> String {
    let mut kept: String = line.to_string();
    loop {
        let candidate = format!("{kept}...");
        if kept.is_empty() || text_width(font, size, &candidate) <= max_width {
            return candidate;
        }
        kept.pop();
    }
}

/// Wrap cell text, capping it at `max_lines` with an ellipsis
fn wrap_cell(text: &str, column: &Column, max_lines: usize) -> Vec<String> {
    let size = layout::BODY_FONT_SIZE;
    let mut lines = wrap_text(Font::Helvetica, size, text, column.inner_width());
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.pop() {
            lines.push(ellipsize(&last, Font::Helvetica, size, column.inner_width()));
        }
    }
    lines
}

struct Composer<'a> {
    pdf: PdfBuilder,
    branding: &'a Branding,
    logo: Option<ImageId>,
    metadata: Vec<(&'static str, String)>,
    columns: Vec<Column>,
    y: f32,
    /// First body y on a page; identical on every page
    body_top: f32,
}

impl<'a> Composer<'a> {
    fn new(branding: &'a Branding, metadata: Vec<(&'static str, String)>) -> Self {
        let mut pdf = PdfBuilder::new(layout::PAGE);
        let logo = branding.logo.clone().map(|image| pdf.add_image(image));
        Self {
            pdf,
            branding,
            logo,
            metadata,
            columns: layout::columns(layout::MARGIN, layout::content_width()),
            y: layout::MARGIN,
            body_top: layout::MARGIN,
        }
    }

    /// Draw the header block (and optionally the table header) on the
    /// current page if it is blank, otherwise on a new page
    fn start_page(&mut self, with_table_header: bool) -> Result<(), RenderError> {
        if self.y > layout::MARGIN {
            self.pdf.add_page();
        }
        self.y = self.draw_header()?;
        if with_table_header {
            self.draw_table_header();
        }
        self.body_top = self.y;
        Ok(())
    }

    /// Returns the y below the header block
    fn draw_header(&mut self) -> Result<f32, RenderError> {
        let top = layout::MARGIN;
        let width = layout::content_width();
        let half = width / 2.0;

        // Brand mark
        let brand_bottom = match self.logo {
            Some(id) => {
                let aspect = self
                    .branding
                    .logo
                    .as_ref()
                    .map(RasterImage::aspect_ratio)
                    .unwrap_or(1.0);
                let (w, h) = layout::logo_size(aspect);
                self.pdf.draw_image(id, layout::MARGIN, top, w, h)?;
                top + h
            }
            None => {
                let size = layout::BRAND_FONT_SIZE;
                let name =
                    truncate_to_width(Font::HelveticaBold, size, &self.branding.name, half - 12.0);
                self.pdf
                    .text(layout::MARGIN, top, Font::HelveticaBold, size, TEXT, &name);
                top + line_height(size)
            }
        };
        let title_top = brand_bottom + 8.0;
        self.pdf.text(
            layout::MARGIN,
            title_top,
            Font::HelveticaBold,
            layout::TITLE_FONT_SIZE,
            MUTED,
            TITLE,
        );
        let left_bottom = title_top + line_height(layout::TITLE_FONT_SIZE);

        // Metadata panel
        let panel_x = layout::MARGIN + half;
        let panel_h = layout::panel_height(self.metadata.len());
        self.pdf
            .fill_rect(panel_x, top, half, panel_h, PANEL_FILL)
            .stroke_rect(panel_x, top, half, panel_h, RULE, 0.5);

        let size = layout::PANEL_FONT_SIZE;
        let label_x = panel_x + layout::PANEL_PADDING;
        let value_x = label_x + layout::PANEL_LABEL_WIDTH;
        let value_width = half - 2.0 * layout::PANEL_PADDING - layout::PANEL_LABEL_WIDTH;
        let text_offset = (layout::PANEL_ROW_HEIGHT - line_height(size)) / 2.0;
        for (i, (label, value)) in self.metadata.iter().enumerate() {
            let row_top = top + layout::PANEL_PADDING + i as f32 * layout::PANEL_ROW_HEIGHT;
            let value = truncate_to_width(Font::Helvetica, size, value, value_width);
            self.pdf
                .text(label_x, row_top + text_offset, Font::HelveticaBold, size, MUTED, label)
                .text(value_x, row_top + text_offset, Font::Helvetica, size, TEXT, &value);
        }

        Ok(left_bottom.max(top + panel_h) + layout::HEADER_GAP)
    }

    fn draw_table_header(&mut self) {
        let h = layout::TABLE_HEADER_HEIGHT;
        let size = layout::BODY_FONT_SIZE;
        let text_top = self.y + (h - line_height(size)) / 2.0;

        self.pdf.fill_rect(
            layout::MARGIN,
            self.y,
            layout::content_width(),
            h,
            HEADER_FILL,
        );
        for column in &self.columns {
            let title =
                truncate_to_width(Font::HelveticaBold, size, column.title, column.inner_width());
            match column.align {
                Align::Left => self.pdf.text(
                    column.text_left(),
                    text_top,
                    Font::HelveticaBold,
                    size,
                    Rgb::WHITE,
                    &title,
                ),
                Align::Right => self.pdf.text_right(
                    column.text_right(),
                    text_top,
                    Font::HelveticaBold,
                    size,
                    Rgb::WHITE,
                    &title,
                ),
            };
        }
        self.y += h;
    }

    fn draw_row(&mut self, index: usize, line: &QuoteLine) -> Result<RowPlacement, RenderError> {
        let max_lines = layout::max_row_lines(self.body_top);
        let sku = wrap_cell(&line.sku, &self.columns[0], max_lines);
        let name = wrap_cell(&line.name, &self.columns[1], max_lines);
        let height = layout::row_height(sku.len().max(name.len()));

        if !layout::fits(self.y, height) {
            self.start_page(true)?;
        }

        let top = self.y;
        let width = layout::content_width();
        // Shading follows the line index so it continues across pages
        if index % 2 == 1 {
            self.pdf
                .fill_rect(layout::MARGIN, top, width, height, SHADE_FILL);
        }

        let size = layout::BODY_FONT_SIZE;
        let lh = line_height(size);
        let text_top = top + layout::CELL_PAD_TOP;
        for (cell, column) in [(&sku, &self.columns[0]), (&name, &self.columns[1])] {
            for (i, text) in cell.iter().enumerate() {
                self.pdf.text(
                    column.text_left(),
                    text_top + i as f32 * lh,
                    Font::Helvetica,
                    size,
                    TEXT,
                    text,
                );
            }
        }

        let symbol = &self.branding.currency_symbol;
        let numbers = [
            line.qty.to_string(),
            format_money(line.unit_price_ex_vat, symbol),
            format_money(line.line_total_ex_vat, symbol),
        ];
        for (value, column) in numbers.iter().zip(&self.columns[2..]) {
            let value = truncate_to_width(Font::Helvetica, size, value, column.inner_width());
            self.pdf
                .text_right(column.text_right(), text_top, Font::Helvetica, size, TEXT, &value);
        }

        self.pdf.line(
            (layout::MARGIN, top + height),
            (layout::MARGIN + width, top + height),
            RULE,
            0.5,
        );
        self.y = top + height;

        Ok(RowPlacement {
            index,
            page: self.pdf.current_page(),
            top,
            height,
        })
    }

    fn draw_totals(&mut self, totals: Totals) -> Result<BlockPlacement, RenderError> {
        let height = layout::totals_height();
        let mut top = self.y + layout::TOTALS_GAP;
        if !layout::fits(top, height) {
            self.start_page(false)?;
            top = self.y;
        }

        let width = layout::TOTALS_WIDTH;
        let x = layout::MARGIN + layout::content_width() - width;
        let pad = layout::TOTALS_PADDING;
        let row_h = layout::TOTALS_ROW_HEIGHT;
        let size = layout::TOTALS_FONT_SIZE;
        let text_offset = (row_h - line_height(size)) / 2.0;
        let symbol = &self.branding.currency_symbol;

        let rows = [
            ("Subtotal (ex VAT)", totals.subtotal_ex_vat, Font::Helvetica),
            ("VAT (20%)", totals.vat, Font::Helvetica),
            ("Total (inc VAT)", totals.total_inc_vat, Font::HelveticaBold),
        ];

        self.pdf
            .fill_rect(x, top + pad + 2.0 * row_h, width, row_h, PANEL_FILL)
            .stroke_rect(x, top, width, height, RULE, 0.75);
        for (i, (label, amount, font)) in rows.iter().enumerate() {
            let row_top = top + pad + i as f32 * row_h + text_offset;
            let amount = format_money(*amount, symbol);
            self.pdf
                .text(x + pad, row_top, *font, size, TEXT, label)
                .text_right(x + width - pad, row_top, *font, size, TEXT, &amount);
        }

        self.y = top + height;
        Ok(BlockPlacement {
            page: self.pdf.current_page(),
            top,
            height,
        })
    }

    /// Stamp contact details and "Page X of N" on every page
    fn draw_footers(&mut self) -> Result<(), RenderError> {
        let count = self.pdf.page_count();
        let size = layout::FOOTER_FONT_SIZE;
        let lh = line_height(size);
        let width = layout::content_width();
        let footer_top = layout::page_bottom() - layout::FOOTER_HEIGHT;
        let text_top = footer_top + 6.0;
        let max_lines = ((layout::FOOTER_HEIGHT - 6.0) / lh).floor() as usize;

        let contact: Vec<&str> = if self.branding.contact_lines.is_empty() {
            vec![self.branding.name.as_str()]
        } else {
            self.branding.contact_lines.iter().map(String::as_str).collect()
        };

        for page in 0..count {
            self.pdf.switch_to_page(page)?;
            self.pdf.line(
                (layout::MARGIN, footer_top),
                (layout::MARGIN + width, footer_top),
                RULE,
                0.5,
            );

            let label = truncate_to_width(
                Font::Helvetica,
                size,
                &format!("Page {} of {}", page + 1, count),
                width / 3.0,
            );
            let label_width = text_width(Font::Helvetica, size, &label);
            self.pdf.text_right(
                layout::MARGIN + width,
                text_top,
                Font::Helvetica,
                size,
                MUTED,
                &label,
            );

            let contact_width = width - label_width - 12.0;
            for (i, line) in contact.iter().take(max_lines).enumerate() {
                let line = truncate_to_width(Font::Helvetica, size, line, contact_width);
                self.pdf.text(
                    layout::MARGIN,
                    text_top + i as f32 * lh,
                    Font::Helvetica,
                    size,
                    MUTED,
                    &line,
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validity;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use shared::models::QuoteStatus;

    fn quote_with_lines(lines: Vec<QuoteLine>) -> Quote {
        let subtotal = lines.iter().map(|l| l.line_total_ex_vat).sum();
        let created = Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap();
        Quote {
            id: 1,
            quote_number: "250115-001".into(),
            quote_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            daily_seq: 1,
            status: QuoteStatus::Draft,
            revision: 0,
            email: "buyer@example.com".into(),
            company: Some("Acme Ltd".into()),
            reference: None,
            notes: None,
            subtotal_ex_vat: subtotal,
            privacy_acknowledged: false,
            privacy_acknowledged_at: None,
            public_token: None,
            public_token_expires_at: None,
            issued_at: None,
            created_at: created,
            updated_at: created,
            lines,
        }
    }

    fn widget(position: i32, name: &str) -> QuoteLine {
        QuoteLine {
            position,
            sku: format!("SKU-{position}"),
            name: name.into(),
            qty: 2,
            unit_price_ex_vat: Decimal::new(1000, 2),
            line_total_ex_vat: Decimal::new(2000, 2),
        }
    }

    fn validity_of(quote: &Quote) -> Validity {
        validity::evaluate(
            quote.quote_date,
            quote.status,
            Utc.with_ymd_and_hms(2025, 1, 16, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_metadata_rows_skip_absent_fields() {
        let mut quote = quote_with_lines(vec![]);
        let v = validity_of(&quote);
        let rows = metadata(&quote, v, DisplayStatus::Draft);
        let labels: Vec<_> = rows.iter().map(|(l, _)| *l).collect();
        assert_eq!(
            labels,
            ["Quote no.", "Company", "Customer", "Quote date", "Valid until", "Status"]
        );

        quote.revision = 2;
        quote.reference = Some("PO-7".into());
        let rows = metadata(&quote, v, DisplayStatus::Issued);
        assert!(rows.contains(&("Revision", "2".to_string())));
        assert!(rows.contains(&("Reference", "PO-7".to_string())));
        assert!(rows.contains(&("Valid until", "14 Feb 2025".to_string())));
        assert!(rows.contains(&("Status", "Issued".to_string())));
    }

    #[test]
    fn test_short_quote_is_one_page() {
        let quote = quote_with_lines(vec![widget(0, "Widget"), widget(1, "Gadget")]);
        let doc = DocumentRenderer::default()
            .render(&quote, validity_of(&quote), None)
            .unwrap();
        assert_eq!(doc.page_count, 1);
        assert_eq!(doc.rows.len(), 2);
        assert_eq!(doc.totals.page, 0);
        assert_eq!(doc.file_name, "quote-250115-001.pdf");
        assert!(doc.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let quote = quote_with_lines(vec![widget(0, "Widget")]);
        let renderer = DocumentRenderer::default();
        let a = renderer.render(&quote, validity_of(&quote), None).unwrap();
        let b = renderer.render(&quote, validity_of(&quote), None).unwrap();
        assert_eq!(a.bytes, b.bytes);
    }

    #[test]
    fn test_oversized_row_is_capped_to_one_page() {
        let huge = "word ".repeat(3000);
        let quote = quote_with_lines(vec![widget(0, &huge), widget(1, "Widget")]);
        let doc = DocumentRenderer::default()
            .render(&quote, validity_of(&quote), None)
            .unwrap();
        for row in &doc.rows {
            assert!(row.top + row.height <= layout::content_limit() + 1e-3);
        }
    }

    #[test]
    fn test_ellipsize() {
        let out = ellipsize("Widget with a long name", Font::Helvetica, 9.0, 40.0);
        assert!(out.ends_with("..."));
        assert!(text_width(Font::Helvetica, 9.0, &out) <= 40.0);
    }

    #[test]
    fn test_empty_quote_still_renders_totals() {
        let quote = quote_with_lines(vec![]);
        let doc = DocumentRenderer::default()
            .render(&quote, validity_of(&quote), Some(DisplayStatus::Issued))
            .unwrap();
        assert_eq!(doc.page_count, 1);
        assert!(doc.rows.is_empty());
    }
}
