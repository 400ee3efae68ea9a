//! # Formats Module
//!
//! On-disk encoding of reflection records.

mod persistence;

pub use persistence::*;
