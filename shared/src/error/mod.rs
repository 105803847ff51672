//! Coded errors shared by the quote engine
//!
//! - [`ErrorCode`]: numeric codes, serialized as plain numbers
//! - [`AppError`]: a code plus message and optional structured details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 4xxx: Quote errors
//! - 5xxx: Delivery errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::with_message(ErrorCode::QuoteLineInvalid, "Line 1: sku is required")
//!     .with_detail("line", 1);
//! assert_eq!(err.code.code(), 4002);
//! assert_eq!(err.http_status(), shared::http::StatusCode::BAD_REQUEST);
//! ```

mod codes;
mod http;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::AppError;
