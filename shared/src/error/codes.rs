//! Numeric error codes
//!
//! - 0xxx: General errors
//! - 4xxx: Quote errors (41xx: public access tokens)
//! - 5xxx: Delivery errors (document rendering, email)
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Input failed validation outside the quote lines
    ValidationFailed = 2,

    // ==================== 4xxx: Quote ====================
    QuoteNotFound = 4001,
    /// A quote line failed validation
    QuoteLineInvalid = 4002,
    /// Quote number allocation lost to concurrent writers
    QuoteNumberConflict = 4003,
    /// No quote numbers left for the day
    QuoteDailyLimitReached = 4004,
    QuoteTokenMissing = 4101,
    /// Access token does not grant access to this quote
    QuoteTokenInvalid = 4102,
    QuoteTokenExpired = 4103,

    // ==================== 5xxx: Delivery ====================
    DocumentRenderFailed = 5001,
    /// No email provider configured, or sender invalid
    EmailNotConfigured = 5101,
    /// Recipient address rejected before sending
    EmailInvalidRecipient = 5102,
    /// Email provider rejected or failed the send
    EmailDeliveryFailed = 5103,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default English message
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Validation failed",

            ErrorCode::QuoteNotFound => "Quote not found",
            ErrorCode::QuoteLineInvalid => "Quote line is invalid",
            ErrorCode::QuoteNumberConflict => {
                "Could not allocate a quote number, please retry"
            }
            ErrorCode::QuoteDailyLimitReached => "Daily quote limit reached",
            ErrorCode::QuoteTokenMissing => "Access token is required",
            ErrorCode::QuoteTokenInvalid => "Access token is invalid",
            ErrorCode::QuoteTokenExpired => "Access link has expired",

            ErrorCode::DocumentRenderFailed => "Document rendering failed",
            ErrorCode::EmailNotConfigured => "Email delivery is not configured",
            ErrorCode::EmailInvalidRecipient => "Invalid email recipient",
            ErrorCode::EmailDeliveryFailed => "Email delivery failed",

            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A number that is not an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(ErrorCode::ValidationFailed),

            4001 => Ok(ErrorCode::QuoteNotFound),
            4002 => Ok(ErrorCode::QuoteLineInvalid),
            4003 => Ok(ErrorCode::QuoteNumberConflict),
            4004 => Ok(ErrorCode::QuoteDailyLimitReached),
            4101 => Ok(ErrorCode::QuoteTokenMissing),
            4102 => Ok(ErrorCode::QuoteTokenInvalid),
            4103 => Ok(ErrorCode::QuoteTokenExpired),

            5001 => Ok(ErrorCode::DocumentRenderFailed),
            5101 => Ok(ErrorCode::EmailNotConfigured),
            5102 => Ok(ErrorCode::EmailInvalidRecipient),
            5103 => Ok(ErrorCode::EmailDeliveryFailed),

            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
