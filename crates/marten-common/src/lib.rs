//! Common utilities for the Marten style resolver.
//!
//! This crate provides shared infrastructure used by all resolver components:
//! - **Warning System** - deduplicated diagnostics for recoverable failures

pub mod warning;
