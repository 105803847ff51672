//! # quote-pdf
//!
//! Page-description building blocks - low-level drawing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to draw:
//! - Page management in a top-left coordinate system
//! - WinAnsi text encoding for the standard Helvetica fonts
//! - Font metrics, word wrapping and truncation
//! - Rectangles, rules and raster images
//! - Deterministic serialization (no timestamps, no document IDs)
//!
//! Business logic (WHAT to draw) stays in application code:
//! - Quote document layout and pagination → quote-engine
//!
//! ## Example
//!
//! ```
//! use quote_pdf::{Font, PageSize, PdfBuilder, Rgb};
//!
//! let mut pdf = PdfBuilder::new(PageSize::A4);
//! pdf.text(40.0, 40.0, Font::HelveticaBold, 18.0, Rgb::BLACK, "Quote 250115-001");
//! pdf.fill_rect(40.0, 70.0, 515.0, 1.0, Rgb::gray(0.8));
//! let bytes = pdf.build().unwrap();
//! assert!(bytes.starts_with(b"%PDF-"));
//! ```

mod builder;
mod encoding;
mod error;
mod raster;
mod metrics;

// Re-exports
pub use builder::{ImageId, PageSize, PdfBuilder, Rgb};
pub use encoding::to_winansi;
pub use error::{PdfError, PdfResult};
pub use raster::RasterImage;
pub use metrics::{Font, line_height, text_width, truncate_to_width, wrap_text};

#[cfg(feature = "image")]
pub use raster::{decode_image, load_image};
