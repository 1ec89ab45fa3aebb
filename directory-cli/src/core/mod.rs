//! Core search logic and session state
//!
//! This module contains the pagination controller, the session state it owns,
//! and the seams it talks through (search backend and result renderer).

pub mod backend;
pub mod render;
pub mod search_controller;
pub mod search_session;

pub use backend::SearchBackend;
pub use render::{RenderDirective, ResultRenderer};
pub use search_controller::{FetchOutcome, SearchController};
pub use search_session::{SearchQuery, SearchSession};
