//! Shared types for the quote engine
//!
//! Domain models and the unified error system used by every crate in the
//! workspace.

pub mod error;
pub mod models;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};
