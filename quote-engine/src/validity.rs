//! Quote validity window
//!
//! A quote is valid for 30 days from its quote date. "Expired" is a display
//! status only: it is derived on every read and never stored.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::models::QuoteStatus;
use std::fmt;

/// Days a quote stays valid after its quote date
pub const VALIDITY_DAYS: u64 = 30;

/// Status shown to a reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStatus {
    Draft,
    Issued,
    Expired,
}

impl DisplayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Issued => "issued",
            Self::Expired => "expired",
        }
    }

    /// Capitalised label for documents
    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Issued => "Issued",
            Self::Expired => "Expired",
        }
    }
}

impl From<QuoteStatus> for DisplayStatus {
    fn from(status: QuoteStatus) -> Self {
        match status {
            QuoteStatus::Draft => Self::Draft,
            QuoteStatus::Issued => Self::Issued,
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived validity of a quote at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validity {
    pub valid_until: NaiveDate,
    pub status: DisplayStatus,
}

impl Validity {
    pub fn is_expired(&self) -> bool {
        self.status == DisplayStatus::Expired
    }
}

/// Last day the quote is valid
pub fn valid_until(quote_date: NaiveDate) -> NaiveDate {
    quote_date
        .checked_add_days(Days::new(VALIDITY_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

/// Derive the display status, comparing calendar dates only
pub fn evaluate(quote_date: NaiveDate, stored: QuoteStatus, now: DateTime<Utc>) -> Validity {
    let valid_until = valid_until(quote_date);
    let status = if now.date_naive() > valid_until {
        DisplayStatus::Expired
    } else {
        stored.into()
    };
    Validity {
        valid_until,
        status,
    }
}
