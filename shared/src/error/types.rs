//! The coded error value

use super::codes::ErrorCode;
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// An error as reported to operators and callers
///
/// `details` carries structured context such as the offending line number
/// or the email provider name.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, Value>>,
}

impl AppError {
    /// Error carrying the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_message() {
        let err = AppError::new(ErrorCode::QuoteNotFound);
        assert_eq!(err.message, "Quote not found");
        assert_eq!(err.to_string(), "Quote not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_details_accumulate() {
        let err = AppError::with_message(ErrorCode::EmailDeliveryFailed, "resend returned 422")
            .with_detail("provider", "resend")
            .with_detail("status", 422);

        let details = err.details.as_ref().unwrap();
        assert_eq!(details["provider"], "resend");
        assert_eq!(details["status"], 422);
        assert_eq!(err.http_status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_serializes_code_as_number() {
        let err = AppError::new(ErrorCode::QuoteNumberConflict).with_detail("attempts", 3);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], 4003);
        assert_eq!(json["details"]["attempts"], 3);

        let bare = serde_json::to_value(AppError::new(ErrorCode::InternalError)).unwrap();
        assert!(bare.get("details").is_none());
    }
}
