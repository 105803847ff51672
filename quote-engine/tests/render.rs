//! Document pagination, checked by re-parsing the produced PDF

use chrono::{NaiveDate, TimeZone, Utc};
use quote_engine::render::{Branding, DocumentRenderer, layout};
use quote_engine::validity::{self, DisplayStatus};
use rust_decimal::Decimal;
use shared::models::{Quote, QuoteLine, QuoteStatus};

const LONG_DESCRIPTION: &str = "Heavy duty galvanised steel shelving unit with five adjustable \
    shelves, reinforced corner brackets, rubber floor protectors and a ten year warranty \
    covering rust, warping and weld failure under normal warehouse load conditions";

fn quote_with_lines(count: usize, description: &str) -> Quote {
    let at = Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap();
    let lines: Vec<QuoteLine> = (0..count)
        .map(|i| QuoteLine {
            position: i as i32,
            sku: format!("SHELF-{i:04}"),
            name: description.to_string(),
            qty: (i as i32 % 7) + 1,
            unit_price_ex_vat: Decimal::new(12_950, 2),
            line_total_ex_vat: Decimal::new(12_950, 2) * Decimal::from((i as i32 % 7) + 1),
        })
        .collect();
    let subtotal = lines.iter().map(|l| l.line_total_ex_vat).sum();
    Quote {
        id: 1,
        quote_number: "250115-001".into(),
        quote_date: at.date_naive(),
        daily_seq: 1,
        status: QuoteStatus::Issued,
        revision: 2,
        email: "buyer@example.com".into(),
        company: Some("Acme Warehousing Ltd".into()),
        reference: Some("PO-7781".into()),
        notes: None,
        subtotal_ex_vat: subtotal,
        privacy_acknowledged: true,
        privacy_acknowledged_at: Some(at),
        public_token: None,
        public_token_expires_at: None,
        issued_at: Some(at),
        created_at: at,
        updated_at: at,
        lines,
    }
}

fn renderer() -> DocumentRenderer {
    DocumentRenderer::new(Branding {
        contact_lines: vec![
            "Storefront Ltd, 1 High Street, London".into(),
            "sales@storefront.example | 020 7946 0000".into(),
        ],
        ..Branding::default()
    })
}

fn contains(content: &[u8], text: &str) -> bool {
    content
        .windows(text.len())
        .any(|window| window == text.as_bytes())
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 20, 9, 0, 0).unwrap()
}

#[test]
fn forty_long_lines_span_pages_without_crossing_the_footer() {
    let quote = quote_with_lines(40, LONG_DESCRIPTION);
    let validity = validity::evaluate(quote.quote_date, quote.status, now());
    let document = renderer().render(&quote, validity, None).unwrap();

    assert!(document.page_count > 1);
    let parsed = lopdf::Document::load_mem(&document.bytes).unwrap();
    assert_eq!(parsed.get_pages().len(), document.page_count);

    // Table header and footer on every page
    let total = document.page_count;
    for (number, page_id) in parsed.get_pages() {
        let content = parsed.get_page_content(page_id).unwrap();
        for title in ["(SKU)", "(Description)", "(Qty)", "(Line total)"] {
            assert!(
                contains(&content, title),
                "page {number} is missing column {title}"
            );
        }
        let footer = format!("(Page {number} of {total})");
        assert!(contains(&content, &footer), "page {number} is missing {footer}");
    }

    assert_eq!(document.rows.len(), 40);
    for (i, row) in document.rows.iter().enumerate() {
        assert_eq!(row.index, i);
        assert!(row.page < document.page_count);
        assert!(
            row.top + row.height <= layout::content_limit() + 0.01,
            "row {i} ends at {} past {}",
            row.top + row.height,
            layout::content_limit()
        );
    }

    // Rows keep their order across pages
    for pair in document.rows.windows(2) {
        assert!(pair[1].page >= pair[0].page);
        if pair[1].page == pair[0].page {
            assert!(pair[1].top >= pair[0].top + pair[0].height - 0.01);
        }
    }

    // Every page after the first starts its rows at the same place
    let first_tops: Vec<f32> = (1..document.page_count)
        .filter_map(|p| document.rows.iter().find(|r| r.page == p).map(|r| r.top))
        .collect();
    for top in first_tops.windows(2) {
        assert!((top[0] - top[1]).abs() < 0.01);
    }

    let totals = document.totals;
    assert!(totals.page >= document.rows[39].page);
    assert!(totals.top + totals.height <= layout::content_limit() + 0.01);
}

#[test]
fn single_short_line_fits_one_page() {
    let quote = quote_with_lines(1, "Widget");
    let validity = validity::evaluate(quote.quote_date, quote.status, now());
    let document = renderer().render(&quote, validity, None).unwrap();

    assert_eq!(document.page_count, 1);
    let parsed = lopdf::Document::load_mem(&document.bytes).unwrap();
    assert_eq!(parsed.get_pages().len(), 1);
    assert_eq!(document.totals.page, 0);
}

#[test]
fn status_override_is_accepted_for_expired_quotes() {
    let quote = quote_with_lines(3, "Widget");
    let late = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    let validity = validity::evaluate(quote.quote_date, quote.status, late);
    assert_eq!(validity.status, DisplayStatus::Expired);
    assert_eq!(
        validity.valid_until,
        NaiveDate::from_ymd_opt(2025, 2, 14).unwrap()
    );

    let document = renderer()
        .render(&quote, validity, Some(DisplayStatus::Issued))
        .unwrap();
    assert!(document.bytes.starts_with(b"%PDF"));
}

#[test]
fn logo_file_is_embedded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logo.png");
    image::RgbImage::from_pixel(8, 4, image::Rgb([200, 30, 30]))
        .save(&path)
        .unwrap();

    let branding = Branding::default().with_logo_file(&path);
    assert!(branding.logo.is_some());

    let quote = quote_with_lines(2, "Widget");
    let validity = validity::evaluate(quote.quote_date, quote.status, now());
    let document = DocumentRenderer::new(branding)
        .render(&quote, validity, None)
        .unwrap();

    let parsed = lopdf::Document::load_mem(&document.bytes).unwrap();
    let images = parsed
        .objects
        .values()
        .filter_map(|object| object.as_stream().ok())
        .filter(|stream| {
            stream
                .dict
                .get(b"Subtype")
                .and_then(|subtype| subtype.as_name())
                .is_ok_and(|name| name == b"Image")
        })
        .count();
    assert_eq!(images, 1);
}
