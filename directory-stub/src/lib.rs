//! In-process stand-in for the directory backend.
//!
//! Serves the same five endpoints as the real site from generated listings,
//! so the client can be developed and tested without network access.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cached::{Cached, TimedCache};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_LISTINGS_PER_QUERY: usize = 25;

/// First pages are served "from cache" for a day after they were first built
const CACHE_LIFESPAN_SECS: u64 = 86_400;

const QUOTE_FIELDS: [&str; 6] = ["name", "email", "phone", "service", "location", "description"];
const REGISTRATION_FIELDS: [&str; 7] = [
    "name",
    "email",
    "phone",
    "company",
    "service",
    "location",
    "description",
];

const NAME_PREFIXES: [&str; 6] = ["Lone Star", "Capitol", "Bluebonnet", "Hill Country", "Riverside", "Summit"];

fn default_categories() -> Vec<String> {
    [
        "Plumbing",
        "Electrical",
        "Roofing",
        "HVAC Repair",
        "Landscaping",
        "House Cleaning",
        "Painting",
        "Pest Control",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_locations() -> Vec<String> {
    ["Austin, TX", "Dallas, TX", "Houston, TX", "San Antonio, TX"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Failure served in place of the next search
#[derive(Debug, Clone)]
enum SearchFault {
    /// 200 with `{"error": message}`
    Embedded(String),
    /// Given status with an HTML body, as a proxy in front of the backend would send
    Status(StatusCode),
    /// 200 with a body that is not JSON
    Garbled,
}

struct StubInner {
    categories: Vec<String>,
    locations: Vec<String>,
    page_size: usize,
    listings_per_query: usize,
    first_pages: Mutex<TimedCache<(String, String), ()>>,
    pending_fault: Mutex<Option<SearchFault>>,
    search_hits: AtomicUsize,
    quotes: Mutex<Vec<Value>>,
    registrations: Mutex<Vec<Value>>,
}

/// Shared handler state; cheap to clone
#[derive(Clone)]
pub struct StubState {
    inner: Arc<StubInner>,
}

impl Default for StubState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, DEFAULT_LISTINGS_PER_QUERY)
    }
}

impl StubState {
    pub fn new(page_size: usize, listings_per_query: usize) -> Self {
        Self {
            inner: Arc::new(StubInner {
                categories: default_categories(),
                locations: default_locations(),
                page_size: page_size.max(1),
                listings_per_query,
                first_pages: Mutex::new(TimedCache::with_lifespan(CACHE_LIFESPAN_SECS)),
                pending_fault: Mutex::new(None),
                search_hits: AtomicUsize::new(0),
                quotes: Mutex::new(Vec::new()),
                registrations: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The next search answers 200 with `{"error": message}`
    pub fn fail_next_search(&self, message: &str) {
        *self.inner.pending_fault.lock() = Some(SearchFault::Embedded(message.to_string()));
    }

    /// The next search answers `status` with an HTML page instead of JSON
    pub fn fail_next_search_with_status(&self, status: u16) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
        *self.inner.pending_fault.lock() = Some(SearchFault::Status(status));
    }

    /// The next search answers 200 with a body that does not parse
    pub fn garble_next_search(&self) {
        *self.inner.pending_fault.lock() = Some(SearchFault::Garbled);
    }

    /// Number of search requests received
    pub fn search_hits(&self) -> usize {
        self.inner.search_hits.load(Ordering::SeqCst)
    }

    pub fn quotes(&self) -> Vec<Value> {
        self.inner.quotes.lock().clone()
    }

    pub fn registrations(&self) -> Vec<Value> {
        self.inner.registrations.lock().clone()
    }

    /// Listings for a known category, empty otherwise
    fn listings(&self, category: &str, location: &str) -> Vec<Value> {
        if !self.inner.categories.iter().any(|c| c == category) {
            return Vec::new();
        }

        (0..self.inner.listings_per_query)
            .map(|i| {
                let mut place = json!({
                    "name": format!("{} {} {}", NAME_PREFIXES[i % NAME_PREFIXES.len()], category, i + 1),
                    "address": format!("{} Main St, {}", 100 + i * 7, location),
                    "phone": format!("(512) 555-{:04}", 100 + i),
                    "rating": 3.0 + (i % 5) as f64 * 0.5,
                    "reviews": 10 + i * 3,
                    "business_type": category,
                    "opening_hours": { "open_now": i % 3 != 0 },
                    "place_id": format!("stub-{}-{}", category.to_lowercase().replace(' ', "-"), i),
                });
                if i % 2 == 0 {
                    place["website"] = json!(format!("https://example.com/listing/{}", i));
                }
                place
            })
            .collect()
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn categories(State(state): State<StubState>) -> Json<Vec<String>> {
    Json(state.inner.categories.clone())
}

async fn locations(State(state): State<StubState>) -> Json<Vec<String>> {
    Json(state.inner.locations.clone())
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    category: Option<String>,
    location: Option<String>,
    current_count: Option<u64>,
    page_token: Option<String>,
}

/// Tokens are opaque to clients; here they encode the next offset
fn decode_token(token: &str) -> Option<usize> {
    token.strip_prefix("pg-")?.parse().ok()
}

async fn search(State(state): State<StubState>, Query(params): Query<SearchParams>) -> Response {
    state.inner.search_hits.fetch_add(1, Ordering::SeqCst);

    let (Some(category), Some(location)) = (
        params.category.filter(|c| !c.trim().is_empty()),
        params.location.filter(|l| !l.trim().is_empty()),
    ) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing required parameters");
    };

    let fault = state.inner.pending_fault.lock().take();
    if let Some(fault) = fault {
        warn!("search for {} in {} failing with {:?}", category, location, fault);
        return match fault {
            SearchFault::Embedded(message) => Json(json!({ "error": message })).into_response(),
            SearchFault::Status(status) => (
                status,
                Html("<html><body><h1>Bad Gateway</h1></body></html>"),
            )
                .into_response(),
            SearchFault::Garbled => (StatusCode::OK, "<html>maintenance</html>").into_response(),
        };
    }

    let offset = match params.page_token.as_deref() {
        None | Some("") => 0,
        Some(token) => match decode_token(token) {
            Some(offset) => offset,
            None => return error_response(StatusCode::BAD_REQUEST, "Invalid page token"),
        },
    };

    let from_cache = if offset == 0 {
        let mut cache = state.inner.first_pages.lock();
        let key = (category.clone(), location.clone());
        let hit = cache.cache_get(&key).is_some();
        if !hit {
            cache.cache_set(key, ());
        }
        hit
    } else {
        false
    };

    let listings = state.listings(&category, &location);
    let total = listings.len();
    let places: Vec<Value> = listings
        .into_iter()
        .skip(offset)
        .take(state.inner.page_size)
        .collect();
    let current_count = (offset + places.len()).min(total);
    let has_more = current_count < total;

    info!(
        "search {} in {}: current_count={} offset={} returned={} total={}",
        category,
        location,
        params.current_count.unwrap_or(0),
        offset,
        places.len(),
        total
    );

    let mut body = Map::new();
    body.insert("places".into(), Value::Array(places));
    body.insert("total_results".into(), json!(total));
    body.insert("current_count".into(), json!(current_count));
    body.insert("has_more".into(), json!(has_more));
    body.insert("from_cache".into(), json!(from_cache));
    if has_more {
        body.insert("next_page".into(), json!(format!("pg-{}", current_count)));
    }
    Json(Value::Object(body)).into_response()
}

/// Name of the first required field that is missing or blank
fn missing_field<'a>(body: &Value, required: &[&'a str]) -> Option<&'a str> {
    required.iter().copied().find(|field| match body.get(*field) {
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Null) | None => true,
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    })
}

async fn submit_quote(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    if let Some(field) = missing_field(&body, &QUOTE_FIELDS) {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Missing required field: {}", field),
        );
    }
    state.inner.quotes.lock().push(body);
    Json(json!({ "success": true, "message": "Quote request submitted successfully" }))
        .into_response()
}

async fn register_professional(
    State(state): State<StubState>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(field) = missing_field(&body, &REGISTRATION_FIELDS) {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Missing required field: {}", field),
        );
    }
    state.inner.registrations.lock().push(body);
    Json(json!({ "success": true, "message": "Registration submitted successfully" }))
        .into_response()
}

pub fn build_router(state: StubState) -> Router {
    Router::new()
        .route("/api/categories", get(categories))
        .route("/api/locations", get(locations))
        .route("/api/search", get(search))
        .route("/api/submit-quote", post(submit_quote))
        .route("/api/register-professional", post(register_professional))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the stub on an already bound listener until the task is dropped
pub async fn serve(listener: TcpListener, state: StubState) -> std::io::Result<()> {
    axum::serve(listener, build_router(state)).await
}
