use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::models::{ResultPage, SearchRequest, SearchResponseBody, SubmissionReceipt};
use crate::core::backend::SearchBackend;
use crate::error::{ApiError, SearchError};
use crate::services::lead_forms::{ProfessionalRegistration, QuoteRequest};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Pull the backend's `error` message out of a response body, if it has one
fn error_message_from(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
}

/// Error for a non-success status, keeping the backend's message when present
fn status_error(status: u16, body: &str) -> ApiError {
    match error_message_from(body) {
        Some(message) => ApiError::Rejected { status, message },
        None => ApiError::Status { status },
    }
}

/// Message of a success-status submission body; an `error` field or
/// `"success": false` turns it into a failure
fn receipt_message(body: &str) -> Result<String, ApiError> {
    let receipt: SubmissionReceipt = serde_json::from_str(body)
        .map_err(|e| ApiError::Backend(format!("invalid response body: {}", e)))?;
    if let Some(error) = receipt.error {
        return Err(ApiError::Backend(error));
    }
    if receipt.success == Some(false) {
        return Err(ApiError::Backend(
            receipt
                .message
                .unwrap_or_else(|| "Submission was not accepted".to_string()),
        ));
    }

    Ok(receipt
        .message
        .unwrap_or_else(|| "Submitted successfully".to_string()))
}

/// HTTP client for the directory backend
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Client whose requests give up after `timeout`
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn categories(&self) -> Result<Vec<String>, ApiError> {
        self.get_json("/api/categories").await
    }

    pub async fn locations(&self) -> Result<Vec<String>, ApiError> {
        self.get_json("/api/locations").await
    }

    pub async fn submit_quote(&self, request: &QuoteRequest) -> Result<String, ApiError> {
        self.post_form("/api/submit-quote", request).await
    }

    pub async fn register_professional(
        &self,
        registration: &ProfessionalRegistration,
    ) -> Result<String, ApiError> {
        self.post_form("/api/register-professional", registration)
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(target: "api", "GET {} failed with status {}", path, status);
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &text));
        }
        Ok(response.json::<T>().await?)
    }

    async fn post_form<T: Serialize>(&self, path: &str, body: &T) -> Result<String, ApiError> {
        debug!(target: "api", "POST {}", path);

        let response = self.client.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &text));
        }

        receipt_message(&text)
    }
}

#[async_trait]
impl SearchBackend for ApiClient {
    async fn search(&self, request: &SearchRequest) -> Result<ResultPage, SearchError> {
        let response = self
            .client
            .get(self.url("/api/search"))
            .query(&request.query_pairs())
            .send()
            .await
            .map_err(|e| {
                warn!(target: "api", "search transport error: {}", e);
                SearchError::network(None, None)
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|_| SearchError::network(Some(status.as_u16()), None))?;

        if !status.is_success() {
            return Err(SearchError::network(
                Some(status.as_u16()),
                error_message_from(&text),
            ));
        }

        let body: SearchResponseBody = serde_json::from_str(&text).map_err(|e| {
            warn!(target: "api", "undecodable search response: {}", e);
            SearchError::network(Some(status.as_u16()), None)
        })?;

        body.into_page()
    }
}
