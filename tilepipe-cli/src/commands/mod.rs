//! CLI command implementations.
//!
//! - [`fetch`] - Fetch one tile through the provider chain
//! - [`config`] - Configuration management (init, show, path)

pub mod config;
pub mod fetch;
