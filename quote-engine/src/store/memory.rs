//! In-memory quote store
//!
//! Enforces the same uniqueness rules as the PostgreSQL schema. The
//! allocation read and the insert take the lock separately, so concurrent
//! writers can read the same maximum and collide exactly like two database
//! transactions would.

use super::{QuoteContents, QuoteStore, RevisionChange, StoreError, StoreResult};
use crate::allocator::{format_quote_number, next_daily_seq};
use crate::token::PublicToken;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::models::{Quote, QuoteStatus};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryQuoteStore {
    quotes: RwLock<HashMap<String, Quote>>,
    next_id: AtomicI64,
}

impl MemoryQuoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored quotes
    pub async fn len(&self) -> usize {
        self.quotes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.quotes.read().await.is_empty()
    }

    async fn update<F>(&self, quote_number: &str, apply: F) -> StoreResult<Quote>
    where
        F: FnOnce(&mut Quote) + Send,
    {
        let mut quotes = self.quotes.write().await;
        let quote = quotes
            .get_mut(quote_number)
            .ok_or_else(|| StoreError::NotFound(quote_number.to_string()))?;
        apply(quote);
        Ok(quote.clone())
    }
}

#[async_trait]
impl QuoteStore for MemoryQuoteStore {
    async fn insert_next_in_day(
        &self,
        quote_date: NaiveDate,
        contents: &QuoteContents,
    ) -> StoreResult<Quote> {
        let current_max = {
            let quotes = self.quotes.read().await;
            quotes
                .values()
                .filter(|q| q.quote_date == quote_date)
                .map(|q| q.daily_seq)
                .max()
        };
        let daily_seq =
            next_daily_seq(current_max).ok_or(StoreError::SequenceExhausted(quote_date))?;
        let quote_number = format_quote_number(quote_date, daily_seq);

        // Let other writers interleave between read and insert
        tokio::task::yield_now().await;

        let mut quotes = self.quotes.write().await;
        if quotes.contains_key(&quote_number) {
            return Err(StoreError::UniqueViolation("quotes_quote_number_key".into()));
        }
        if quotes
            .values()
            .any(|q| q.quote_date == quote_date && q.daily_seq == daily_seq)
        {
            return Err(StoreError::UniqueViolation("quotes_quote_date_daily_seq_key".into()));
        }

        let quote = Quote {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            quote_number: quote_number.clone(),
            quote_date,
            daily_seq,
            status: QuoteStatus::Draft,
            revision: 0,
            email: contents.email.clone(),
            company: contents.company.clone(),
            reference: contents.reference.clone(),
            notes: contents.notes.clone(),
            subtotal_ex_vat: contents.subtotal_ex_vat,
            privacy_acknowledged: contents.privacy_acknowledged,
            privacy_acknowledged_at: contents.privacy_acknowledged_at,
            public_token: None,
            public_token_expires_at: None,
            issued_at: None,
            created_at: contents.written_at,
            updated_at: contents.written_at,
            lines: contents.lines.clone(),
        };
        quotes.insert(quote_number, quote.clone());
        Ok(quote)
    }

    async fn find_by_number(&self, quote_number: &str) -> StoreResult<Option<Quote>> {
        Ok(self.quotes.read().await.get(quote_number).cloned())
    }

    async fn replace_contents(
        &self,
        quote_number: &str,
        contents: &QuoteContents,
    ) -> StoreResult<Quote> {
        self.update(quote_number, |q| {
            q.email = contents.email.clone();
            q.company = contents.company.clone();
            q.reference = contents.reference.clone();
            q.notes = contents.notes.clone();
            q.subtotal_ex_vat = contents.subtotal_ex_vat;
            q.privacy_acknowledged = contents.privacy_acknowledged;
            q.privacy_acknowledged_at = contents.privacy_acknowledged_at;
            q.lines = contents.lines.clone();
            q.updated_at = contents.written_at;
        })
        .await
    }

    async fn mark_issued(
        &self,
        quote_number: &str,
        issued_at: DateTime<Utc>,
        revision: RevisionChange,
    ) -> StoreResult<Quote> {
        self.update(quote_number, |q| {
            q.status = QuoteStatus::Issued;
            q.issued_at = Some(issued_at);
            match revision {
                RevisionChange::Keep => {}
                RevisionChange::Set(revision) => q.revision = revision,
                RevisionChange::Increment => q.revision += 1,
            }
            q.updated_at = issued_at;
        })
        .await
    }

    async fn set_public_token(
        &self,
        quote_number: &str,
        token: &PublicToken,
    ) -> StoreResult<Quote> {
        self.update(quote_number, |q| {
            q.public_token = Some(token.value.clone());
            q.public_token_expires_at = Some(token.expires_at);
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn contents() -> QuoteContents {
        QuoteContents {
            email: "buyer@example.com".into(),
            company: None,
            reference: None,
            notes: None,
            subtotal_ex_vat: Decimal::ZERO,
            privacy_acknowledged: false,
            privacy_acknowledged_at: None,
            lines: vec![],
            written_at: Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[tokio::test]
    async fn test_sequence_is_per_day() {
        let store = MemoryQuoteStore::new();
        let a = store.insert_next_in_day(day(), &contents()).await.unwrap();
        let b = store.insert_next_in_day(day(), &contents()).await.unwrap();
        let other_day = day().succ_opt().unwrap();
        let c = store.insert_next_in_day(other_day, &contents()).await.unwrap();

        assert_eq!(a.quote_number, "250115-001");
        assert_eq!(b.quote_number, "250115-002");
        assert_eq!(c.quote_number, "250116-001");
        assert_ne!(a.id, b.id);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_updates_on_missing_quote_are_not_found() {
        let store = MemoryQuoteStore::new();
        let issued_at = Utc.with_ymd_and_hms(2025, 1, 15, 11, 0, 0).unwrap();
        assert!(matches!(
            store
                .mark_issued("250115-001", issued_at, RevisionChange::Keep)
                .await,
            Err(StoreError::NotFound(_))
        ));
        assert!(store.find_by_number("250115-001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_issued_revision_changes() {
        let store = MemoryQuoteStore::new();
        let q = store.insert_next_in_day(day(), &contents()).await.unwrap();
        let at = Utc.with_ymd_and_hms(2025, 1, 15, 11, 0, 0).unwrap();

        let q1 = store
            .mark_issued(&q.quote_number, at, RevisionChange::Keep)
            .await
            .unwrap();
        assert_eq!(q1.status, QuoteStatus::Issued);
        assert_eq!(q1.revision, 0);
        assert_eq!(q1.issued_at, Some(at));

        let q2 = store
            .mark_issued(&q.quote_number, at, RevisionChange::Set(3))
            .await
            .unwrap();
        assert_eq!(q2.revision, 3);

        let q3 = store
            .mark_issued(&q.quote_number, at, RevisionChange::Increment)
            .await
            .unwrap();
        assert_eq!(q3.revision, 4);
    }
}
