//! Core error handling and validation utilities.
//!
//! This module contains the fundamental cross-cutting pieces of the crate:
//! - The crate-wide error type and result alias
//! - Shape validation for the pixel-processor boundary
//!
//! It also re-exports the commonly used types for convenience.

pub mod errors;
pub mod validation;

pub use errors::{SwapError, SwapResult};
pub use validation::validate_same_shape;
