//! Utility types and functions for warpgate.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam and packed on-disk math records

mod error;
mod math;

pub use error::*;
pub use math::*;
