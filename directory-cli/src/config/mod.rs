//! Configuration module
//!
//! Settings for the backend connection, display, shell behavior and logging.

pub mod config;

pub use config::Config;
