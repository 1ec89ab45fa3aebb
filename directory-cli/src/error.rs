//! Error types for the directory client
//!
//! Validation failures never reach the network; transport and backend
//! failures are reported separately so the caller can tell them apart.

use thiserror::Error;

/// Generic message used when a failed request carries no backend message
pub const GENERIC_NETWORK_FAILURE: &str = "Error searching businesses. Please try again.";

/// Input rejected before any request is issued
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select both a category and location")]
    MissingSelection,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("Preferred date {0} is in the past")]
    DateInPast(chrono::NaiveDate),

    #[error("Select at least one entry for {0}")]
    EmptySelection(&'static str),
}

/// Errors surfaced by the search pagination flow
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Transport failure, non-success HTTP status or an undecodable body
    #[error("{message}")]
    Network { status: Option<u16>, message: String },

    /// Success status whose body carries an `error` field
    #[error("{0}")]
    Backend(String),
}

impl SearchError {
    pub fn network(status: Option<u16>, message: Option<String>) -> Self {
        SearchError::Network {
            status,
            message: message.unwrap_or_else(|| GENERIC_NETWORK_FAILURE.to_string()),
        }
    }

    /// Short label used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::Validation(_) => "validation",
            SearchError::Network { .. } => "network",
            SearchError::Backend(_) => "backend",
        }
    }
}

/// Errors from the non-search endpoints (filters and lead forms)
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("HTTP error! status: {status}")]
    Status { status: u16 },

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("{0}")]
    Backend(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
