//! # direction
//!
//! The Direction Companion application: HTTP API, CLI and configuration
//! on top of `direction-core`.

pub mod api;
pub mod cli;
pub mod config;
