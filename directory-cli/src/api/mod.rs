//! Directory backend API client and models
//!
//! This module handles communication with the directory backend
//! and defines the wire models for its requests and responses.

pub mod client;
pub mod models;

pub use client::ApiClient;
pub use models::{Business, PageCursor, ResultPage, SearchRequest};
