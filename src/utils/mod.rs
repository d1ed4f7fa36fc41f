//! Utility modules for common functionality.
//!
//! Currently this is the logging setup shared by the binary and tests.

pub mod logger;
