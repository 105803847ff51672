//! Quote record manager
//!
//! Validates and prices incoming quote payloads, allocates quote numbers
//! (retrying when a concurrent writer takes the same number) and applies
//! the draft → issued lifecycle.

use crate::allocator::{MAX_ALLOCATION_ATTEMPTS, parse_quote_number};
use crate::clock::Clock;
use crate::money::{self, MAX_AMOUNT, line_total, round_money, to_decimal};
use crate::store::{QuoteContents, QuoteStore, RevisionChange, StoreError};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::models::{Quote, QuoteInput, QuoteLine, QuoteLineInput};
use std::sync::Arc;
use tracing::instrument;
use validator::ValidateEmail;

/// Maximum allowed unit price (ex VAT)
const MAX_UNIT_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line
const MAX_QUANTITY: i64 = 100_000;

/// Record manager errors
#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Quote must contain at least one line")]
    NoLines,

    /// `line` is 1-based
    #[error("Line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },

    #[error("Quote not found: {0}")]
    NotFound(String),

    #[error("Could not allocate a quote number after {attempts} attempts")]
    AllocationConflict { attempts: u32 },

    #[error("No quote numbers left for {0}")]
    DailySequenceExhausted(NaiveDate),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for QuoteError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(number) => QuoteError::NotFound(number),
            StoreError::SequenceExhausted(day) => QuoteError::DailySequenceExhausted(day),
            other => QuoteError::Store(other),
        }
    }
}

pub type QuoteResult<T> = Result<T, QuoteError>;

fn invalid_line(index: usize, reason: impl Into<String>) -> QuoteError {
    QuoteError::InvalidLine {
        line: index + 1,
        reason: reason.into(),
    }
}

/// Validate and price one line
fn build_line(index: usize, input: &QuoteLineInput) -> QuoteResult<QuoteLine> {
    let sku = input.sku.trim();
    if sku.is_empty() {
        return Err(invalid_line(index, "sku is required"));
    }
    let name = input.name.trim();
    if name.is_empty() {
        return Err(invalid_line(index, "name is required"));
    }

    if input.qty <= 0 {
        return Err(invalid_line(
            index,
            format!("qty must be a positive integer, got {}", input.qty),
        ));
    }
    if input.qty > MAX_QUANTITY {
        return Err(invalid_line(
            index,
            format!("qty exceeds maximum allowed ({MAX_QUANTITY}), got {}", input.qty),
        ));
    }

    let price = input.unit_price_ex_vat;
    if !price.is_finite() {
        return Err(invalid_line(
            index,
            format!("unit_price_ex_vat must be a finite number, got {price}"),
        ));
    }
    if price < 0.0 {
        return Err(invalid_line(
            index,
            format!("unit_price_ex_vat must be non-negative, got {price}"),
        ));
    }
    if price > MAX_UNIT_PRICE {
        return Err(invalid_line(
            index,
            format!("unit_price_ex_vat exceeds maximum allowed ({MAX_UNIT_PRICE}), got {price}"),
        ));
    }

    // Bounded by MAX_QUANTITY above
    let qty = input.qty as i32;
    // The stored unit price is what the total is computed from
    let unit_price = round_money(to_decimal(price));
    let total = line_total(qty, unit_price);
    if total > MAX_AMOUNT {
        return Err(invalid_line(
            index,
            format!("line total exceeds maximum allowed ({MAX_AMOUNT}), got {total}"),
        ));
    }
    Ok(QuoteLine {
        position: index as i32,
        sku: sku.to_string(),
        name: name.to_string(),
        qty,
        unit_price_ex_vat: unit_price,
        line_total_ex_vat: total,
    })
}

/// Validate every line, failing on the first bad one
///
/// The running subtotal is bounded too; the line that pushes it over the
/// limit is the one reported.
pub fn build_lines(inputs: &[QuoteLineInput]) -> QuoteResult<Vec<QuoteLine>> {
    if inputs.is_empty() {
        return Err(QuoteError::NoLines);
    }
    let mut lines = Vec::with_capacity(inputs.len());
    let mut running = Decimal::ZERO;
    for (index, input) in inputs.iter().enumerate() {
        let line = build_line(index, input)?;
        running += line.line_total_ex_vat;
        if running > MAX_AMOUNT {
            return Err(invalid_line(
                index,
                format!("subtotal exceeds maximum allowed ({MAX_AMOUNT})"),
            ));
        }
        lines.push(line);
    }
    Ok(lines)
}

fn normalize_email(email: &str) -> QuoteResult<String> {
    let email = email.trim().to_string();
    if !email.validate_email() {
        return Err(QuoteError::InvalidEmail(email));
    }
    Ok(email)
}

fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Validate an input and price it into storable contents
///
/// `previous` carries the stored acknowledgement on update so its
/// timestamp is kept.
fn build_contents(
    input: &QuoteInput,
    previous: Option<&Quote>,
    now: DateTime<Utc>,
) -> QuoteResult<QuoteContents> {
    let email = normalize_email(&input.email)?;
    let lines = build_lines(&input.lines)?;
    let subtotal_ex_vat = money::subtotal(&lines);

    let privacy_acknowledged = input
        .privacy_acknowledged
        .unwrap_or_else(|| previous.is_some_and(|q| q.privacy_acknowledged));
    let privacy_acknowledged_at = previous
        .and_then(|q| q.privacy_acknowledged_at)
        .or_else(|| privacy_acknowledged.then_some(now));

    Ok(QuoteContents {
        email,
        company: optional_text(&input.company),
        reference: optional_text(&input.reference),
        notes: optional_text(&input.notes),
        subtotal_ex_vat,
        privacy_acknowledged,
        privacy_acknowledged_at,
        lines,
        written_at: now,
    })
}

/// Create, update and issue quotes
#[derive(Clone)]
pub struct QuoteRecords {
    store: Arc<dyn QuoteStore>,
    clock: Arc<dyn Clock>,
}

impl QuoteRecords {
    pub fn new(store: Arc<dyn QuoteStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create a draft quote numbered within today's UTC date
    #[instrument(skip(self, input), fields(lines = input.lines.len()))]
    pub async fn create(&self, input: &QuoteInput) -> QuoteResult<Quote> {
        let now = self.clock.now();
        let contents = build_contents(input, None, now)?;
        let day = now.date_naive();

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            match self.store.insert_next_in_day(day, &contents).await {
                Ok(quote) => {
                    tracing::info!(
                        quote_number = %quote.quote_number,
                        attempt,
                        subtotal = %quote.subtotal_ex_vat,
                        "Quote created"
                    );
                    return Ok(quote);
                }
                Err(StoreError::UniqueViolation(constraint)) => {
                    tracing::warn!(
                        attempt,
                        constraint = %constraint,
                        "Quote number taken by a concurrent writer"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::error!(%day, attempts = MAX_ALLOCATION_ATTEMPTS, "Quote number allocation failed");
        Err(QuoteError::AllocationConflict {
            attempts: MAX_ALLOCATION_ATTEMPTS,
        })
    }

    /// Replace customer fields and lines of an existing quote
    #[instrument(skip(self, input), fields(lines = input.lines.len()))]
    pub async fn update(&self, quote_number: &str, input: &QuoteInput) -> QuoteResult<Quote> {
        let existing = self.find(quote_number).await?;
        let contents = build_contents(input, Some(&existing), self.clock.now())?;
        let quote = self.store.replace_contents(quote_number, &contents).await?;
        tracing::info!(quote_number = %quote.quote_number, subtotal = %quote.subtotal_ex_vat, "Quote updated");
        Ok(quote)
    }

    pub async fn find(&self, quote_number: &str) -> QuoteResult<Quote> {
        if parse_quote_number(quote_number).is_none() {
            return Err(QuoteError::NotFound(quote_number.to_string()));
        }
        self.store
            .find_by_number(quote_number)
            .await?
            .ok_or_else(|| QuoteError::NotFound(quote_number.to_string()))
    }

    /// Mark as issued now, keeping the revision
    pub async fn issue(&self, quote_number: &str) -> QuoteResult<Quote> {
        let quote = self
            .store
            .mark_issued(quote_number, self.clock.now(), RevisionChange::Keep)
            .await?;
        tracing::info!(quote_number = %quote.quote_number, revision = quote.revision, "Quote issued");
        Ok(quote)
    }

    /// Mark as issued now with an explicit revision
    pub async fn issue_with_revision(&self, quote_number: &str, revision: i32) -> QuoteResult<Quote> {
        let quote = self
            .store
            .mark_issued(quote_number, self.clock.now(), RevisionChange::Set(revision))
            .await?;
        tracing::info!(quote_number = %quote.quote_number, revision, "Quote re-issued");
        Ok(quote)
    }

    /// Mark as issued now and bump the revision in the same write
    pub async fn reissue(&self, quote_number: &str) -> QuoteResult<Quote> {
        let quote = self
            .store
            .mark_issued(quote_number, self.clock.now(), RevisionChange::Increment)
            .await?;
        tracing::info!(quote_number = %quote.quote_number, revision = quote.revision, "Quote re-issued");
        Ok(quote)
    }

    pub fn store(&self) -> &Arc<dyn QuoteStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
