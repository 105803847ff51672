//! Service-level error type
//!
//! `ServiceError` collects the per-module errors so the workflow can use `?`
//! throughout, and converts into the shared [`AppError`] for callers that
//! speak error codes. Infrastructure failures are logged here; database
//! failures report `DatabaseError`, everything else `InternalError`.

use crate::dispatch::{DispatchError, EmailConfigError};
use crate::records::QuoteError;
use crate::render::RenderError;
use crate::store::StoreError;
use crate::token::TokenRejection;
use shared::error::{AppError, ErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error(transparent)]
    Token(#[from] TokenRejection),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    EmailConfig(#[from] EmailConfigError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

fn internal(error: &dyn std::error::Error) -> AppError {
    tracing::error!(error = %error, "Quote service infrastructure error");
    AppError::new(ErrorCode::InternalError)
}

fn store_failure(error: &StoreError) -> AppError {
    match error {
        StoreError::Database(_) | StoreError::Migration(_) => {
            tracing::error!(error = %error, "Quote store database error");
            AppError::new(ErrorCode::DatabaseError)
        }
        StoreError::NotFound(number) => {
            AppError::new(ErrorCode::QuoteNotFound).with_detail("quote_number", number.as_str())
        }
        other => internal(other),
    }
}

impl From<QuoteError> for AppError {
    fn from(e: QuoteError) -> Self {
        match &e {
            QuoteError::InvalidEmail(_) => {
                AppError::with_message(ErrorCode::ValidationFailed, e.to_string())
            }
            QuoteError::NoLines => AppError::with_message(ErrorCode::QuoteLineInvalid, e.to_string()),
            QuoteError::InvalidLine { line, .. } => {
                AppError::with_message(ErrorCode::QuoteLineInvalid, e.to_string())
                    .with_detail("line", *line)
            }
            QuoteError::NotFound(number) => {
                AppError::new(ErrorCode::QuoteNotFound).with_detail("quote_number", number.as_str())
            }
            QuoteError::AllocationConflict { attempts } => {
                AppError::new(ErrorCode::QuoteNumberConflict).with_detail("attempts", *attempts)
            }
            QuoteError::DailySequenceExhausted(day) => {
                AppError::new(ErrorCode::QuoteDailyLimitReached).with_detail("day", day.to_string())
            }
            QuoteError::Store(store) => store_failure(store),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Quote(e) => e.into(),
            ServiceError::Token(rejection) => {
                AppError::with_message(rejection.error_code(), rejection.to_string())
            }
            ServiceError::Store(e) => store_failure(&e),
            ServiceError::Render(e) => {
                tracing::error!(error = %e, "Quote document rendering failed");
                AppError::new(ErrorCode::DocumentRenderFailed)
            }
            ServiceError::EmailConfig(e) => {
                AppError::with_message(ErrorCode::EmailNotConfigured, e.to_string())
            }
            ServiceError::Dispatch(DispatchError::InvalidRecipient(address)) => {
                AppError::new(ErrorCode::EmailInvalidRecipient).with_detail("address", address)
            }
            ServiceError::Dispatch(e) => {
                let provider = e.provider().unwrap_or("unknown");
                AppError::with_message(ErrorCode::EmailDeliveryFailed, e.to_string())
                    .with_detail("provider", provider)
            }
        }
    }
}
