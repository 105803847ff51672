//! Quote persistence
//!
//! [`QuoteStore`] is the seam between the record manager and storage. Two
//! implementations share the same uniqueness rules:
//!
//! - [`PgQuoteStore`]: PostgreSQL via sqlx, the production store
//! - [`MemoryQuoteStore`]: in-process, for tests and local runs
//!
//! A store never retries. `insert_next_in_day` makes exactly one
//! read-increment-insert attempt and reports a lost race as
//! [`StoreError::UniqueViolation`]; the caller owns the retry policy.

mod memory;
mod postgres;

pub use memory::MemoryQuoteStore;
pub use postgres::PgQuoteStore;

use crate::token::PublicToken;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::models::{Quote, QuoteLine};

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Daily sequence exhausted for {0}")]
    SequenceExhausted(NaiveDate),

    #[error("Quote not found: {0}")]
    NotFound(String),

    #[error("Corrupt quote record: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::UniqueViolation(db.constraint().unwrap_or("unknown").to_string())
            }
            _ => StoreError::Database(e),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// What `mark_issued` does to the stored revision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionChange {
    Keep,
    Set(i32),
    /// `revision + 1` in the same write, so concurrent re-issues each count
    Increment,
}

/// Validated, priced contents written on create and update
///
/// Everything here is already normalized: lines are positioned and
/// totalled, the subtotal is their sum.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteContents {
    pub email: String,
    pub company: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub subtotal_ex_vat: Decimal,
    pub privacy_acknowledged: bool,
    pub privacy_acknowledged_at: Option<DateTime<Utc>>,
    pub lines: Vec<QuoteLine>,
    /// Write time; becomes `created_at` on insert
    pub written_at: DateTime<Utc>,
}

/// Quote persistence
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// One allocation attempt: read the day's highest sequence, insert the
    /// quote as `max + 1` with its lines, all in one transaction
    async fn insert_next_in_day(
        &self,
        quote_date: NaiveDate,
        contents: &QuoteContents,
    ) -> StoreResult<Quote>;

    async fn find_by_number(&self, quote_number: &str) -> StoreResult<Option<Quote>>;

    /// Overwrite customer fields and replace every line
    ///
    /// Status, revision and token fields are left alone.
    async fn replace_contents(
        &self,
        quote_number: &str,
        contents: &QuoteContents,
    ) -> StoreResult<Quote>;

    /// Set `status = issued` and `issued_at`, applying `revision`
    async fn mark_issued(
        &self,
        quote_number: &str,
        issued_at: DateTime<Utc>,
        revision: RevisionChange,
    ) -> StoreResult<Quote>;

    /// Overwrite the public token and its expiry
    async fn set_public_token(
        &self,
        quote_number: &str,
        token: &PublicToken,
    ) -> StoreResult<Quote>;
}
