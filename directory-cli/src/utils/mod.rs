//! Utility functions and helpers
//!
//! Application paths and the logging setup shared by the binary and library.

pub mod app_paths;
pub mod dual_logging;
pub mod logging;
