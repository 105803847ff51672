//! Data models
//!
//! Domain models shared between the quote engine and its collaborators.

pub mod quote;

pub use quote::{Quote, QuoteInput, QuoteLine, QuoteLineInput, QuoteStatus};
