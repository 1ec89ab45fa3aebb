use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::SearchError;

/// Opaque resume token handed out by the search endpoint.
///
/// The client never inspects or builds one; it only echoes back what the
/// backend returned as `next_page`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PageCursor {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for PageCursor {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decode a listing field, treating `null` or a value of the wrong shape as absent.
/// One odd record must not cost the whole page.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient::<D, String>(deserializer)?.unwrap_or_default())
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(lenient::<D, bool>(deserializer)?.unwrap_or_default())
}

/// Review counts sometimes arrive as floats (`12.0`)
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n as u64)
    }))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningHours {
    #[serde(default, deserialize_with = "lenient_flag")]
    pub open_now: bool,
}

/// A directory listing as returned by the backend.
///
/// Known fields are typed for rendering; anything else the backend sends is
/// kept in `extra` so the record round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub reviews: Option<u64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub business_type: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<OpeningHours>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Business {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            address: None,
            phone: None,
            website: None,
            rating: None,
            reviews: None,
            business_type: None,
            opening_hours: None,
            extra: Map::new(),
        }
    }
}

/// Parameters of one call to the search endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub category: String,
    pub location: String,
    pub current_count: u64,
    pub page_token: Option<PageCursor>,
}

impl SearchRequest {
    /// Query string pairs in the order the backend documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("category", self.category.clone()),
            ("location", self.location.clone()),
            ("current_count", self.current_count.to_string()),
        ];
        if let Some(token) = &self.page_token {
            pairs.push(("page_token", token.as_str().to_string()));
        }
        pairs
    }
}

/// One page of search results, read once by the controller
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage {
    pub items: Vec<Business>,
    pub total_results: u64,
    pub current_count: u64,
    pub has_more: bool,
    pub next_cursor: Option<PageCursor>,
    pub from_cache: bool,
}

/// Raw body of `GET /api/search`. Every field is optional on the wire: an
/// error body carries only `error`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponseBody {
    #[serde(default)]
    pub places: Option<Vec<Business>>,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub current_count: Option<u64>,
    #[serde(default)]
    pub has_more: Option<bool>,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub from_cache: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SearchResponseBody {
    /// Convert a success-status body into a page, honouring an embedded `error`
    pub fn into_page(self) -> Result<ResultPage, SearchError> {
        if let Some(message) = self.error {
            return Err(SearchError::Backend(message));
        }

        let current_count = self.current_count.ok_or_else(|| {
            SearchError::network(None, Some("malformed search response: missing current_count".into()))
        })?;

        let items = self.places.unwrap_or_default();

        Ok(ResultPage {
            total_results: self.total_results.unwrap_or(current_count),
            current_count,
            has_more: self.has_more.unwrap_or(false),
            next_cursor: self
                .next_page
                .filter(|token| !token.is_empty())
                .map(PageCursor::from),
            from_cache: self.from_cache.unwrap_or(false),
            items,
        })
    }
}

/// Envelope returned by both lead-form endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionReceipt {
    /// Absent on older backends; only an explicit `false` is a refusal
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
