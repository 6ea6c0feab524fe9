//! Utility functions and helpers.
//!
//! - [`error`] - The crate-wide error and result types
//! - [`hash`] - Fast hash map/set aliases

pub mod error;
pub mod hash;
