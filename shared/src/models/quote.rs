//! Quote Model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stored quote status
///
/// "Expired" is never stored: it is derived from `quote_date` at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    #[default]
    Draft,
    Issued,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Issued => "issued",
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "issued" => Ok(Self::Issued),
            other => Err(format!("unknown quote status: {other}")),
        }
    }
}

/// One priced item, owned by exactly one quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    /// 0-based position within the quote
    pub position: i32,
    pub sku: String,
    pub name: String,
    pub qty: i32,
    pub unit_price_ex_vat: Decimal,
    /// `qty × unit_price_ex_vat`, rounded to 2 decimals on its own
    pub line_total_ex_vat: Decimal,
}

/// Quote with its lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: i64,
    /// `YYMMDD-NNN`
    pub quote_number: String,
    pub quote_date: NaiveDate,
    pub daily_seq: i32,
    pub status: QuoteStatus,
    pub revision: i32,
    pub email: String,
    pub company: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub subtotal_ex_vat: Decimal,
    pub privacy_acknowledged: bool,
    /// Set the first time acknowledgement is given, never cleared
    pub privacy_acknowledged_at: Option<DateTime<Utc>>,
    pub public_token: Option<String>,
    pub public_token_expires_at: Option<DateTime<Utc>>,
    pub issued_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<QuoteLine>,
}

/// Line payload for create/update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteLineInput {
    pub sku: String,
    pub name: String,
    pub qty: i64,
    pub unit_price_ex_vat: f64,
}

/// Create/update payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteInput {
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub privacy_acknowledged: Option<bool>,
    #[serde(default)]
    pub lines: Vec<QuoteLineInput>,
}
