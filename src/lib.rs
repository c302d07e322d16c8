#![warn(rust_2018_idioms)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_lossless,            // Infallible casts are clear enough with `as`
    clippy::cast_possible_truncation, // Chunk counts are bounded by MAX_CHUNKS
    clippy::cast_precision_loss,      // Nanosecond timestamps only need millisecond precision
    clippy::cast_sign_loss,           // Safe where values are known non-negative
    clippy::missing_errors_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. DispatchError in dispatcher module
    clippy::must_use_candidate        // Annotated selectively on critical APIs
)]

pub mod app;
pub mod domain;
pub mod endpoint;
pub mod mapper;
pub mod sender;

#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;

// Re-export main types for easy access
pub use app::{App, Config, GelfExporter};
pub use domain::{FlatMessage, GelfLevel};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
