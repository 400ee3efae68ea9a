//! # System Module
//!
//! Runtime introspection of the store, used by the diagnostics endpoint
//! and the `status` command.

mod diagnostics;

pub use diagnostics::*;
