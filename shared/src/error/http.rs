//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::QuoteNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict: allocation lost, caller retries the whole operation
            Self::QuoteNumberConflict | Self::QuoteDailyLimitReached => StatusCode::CONFLICT,

            Self::QuoteTokenMissing | Self::QuoteTokenInvalid => StatusCode::UNAUTHORIZED,

            // 403 Forbidden: the link was genuine but is no longer usable
            Self::QuoteTokenExpired => StatusCode::FORBIDDEN,

            // 502 Bad Gateway: upstream email provider failed
            Self::EmailDeliveryFailed => StatusCode::BAD_GATEWAY,

            Self::InternalError
            | Self::DatabaseError
            | Self::DocumentRenderFailed
            | Self::EmailNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,

            Self::ValidationFailed | Self::QuoteLineInvalid | Self::EmailInvalidRecipient => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_statuses() {
        assert_eq!(
            ErrorCode::QuoteTokenExpired.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ErrorCode::QuoteTokenMissing.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::QuoteTokenInvalid.http_status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_quote_statuses() {
        assert_eq!(
            ErrorCode::QuoteNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::QuoteNumberConflict.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::QuoteLineInvalid.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_delivery_statuses() {
        assert_eq!(
            ErrorCode::EmailDeliveryFailed.http_status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ErrorCode::EmailNotConfigured.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::EmailInvalidRecipient.http_status(),
            StatusCode::BAD_REQUEST
        );
    }
}
