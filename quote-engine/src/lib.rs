//! Quote engine
//!
//! Turns a basket of priced items into a numbered, versioned quote,
//! renders it as a paginated PDF and emails it to the customer with a
//! time-limited public link.
//!
//! # Modules
//!
//! - [`allocator`] / [`records`]: `YYMMDD-NNN` numbering and the draft →
//!   issued lifecycle
//! - [`token`]: public access tokens
//! - [`validity`]: 30-day validity and the derived display status
//! - [`render`]: A4 document layout
//! - [`dispatch`]: email through the first configured provider
//! - [`service`]: the end-to-end workflow
//! - [`store`]: PostgreSQL and in-memory persistence

pub mod allocator;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod links;
pub mod money;
pub mod records;
pub mod render;
pub mod service;
pub mod store;
pub mod token;
pub mod validity;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use service::{DeliveryError, IssueOutcome, QuoteService, QuoteView, ServiceSettings};
