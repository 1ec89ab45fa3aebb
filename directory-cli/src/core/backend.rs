use async_trait::async_trait;

use crate::api::models::{ResultPage, SearchRequest};
use crate::error::SearchError;

/// The search endpoint as seen by the pagination controller.
/// Implemented by the HTTP client and by in-memory fakes in tests.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Fetch one page of results
    async fn search(&self, request: &SearchRequest) -> Result<ResultPage, SearchError>;
}
