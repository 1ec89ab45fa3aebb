pub mod api;
pub mod config;
pub mod core;
pub mod data_exporter;
pub mod error;
pub mod services;
pub mod table_display;
pub mod utils;

pub use crate::core::{FetchOutcome, SearchController, SearchQuery, SearchSession};
pub use crate::error::{ApiError, SearchError, ValidationError};
