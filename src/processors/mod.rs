//! Post-swap frame processors.
//!
//! Processors adjust a swapped face before it is blended back into the
//! source frame. Each processor is a pure function over tensor views and
//! carries no state, so they can run concurrently across frames.

pub mod color_match;

pub use color_match::match_color_distribution;
