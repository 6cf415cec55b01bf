//! Shared utilities for Parlor.
//!
//! Logging setup and timestamp helpers used by the server binary and tests.

pub mod logger;
pub mod time;
