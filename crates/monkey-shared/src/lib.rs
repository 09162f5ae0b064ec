//! # monkey-shared
//!
//! Domain vocabulary shared by the store and the HTTP server: constants,
//! the recurrence tag, input validation and the weekly scoring window.

pub mod constants;
pub mod error;
pub mod types;
pub mod validate;
pub mod week;

pub use error::ValidationError;
pub use types::Recurrence;
