use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::ApiError;

/// Category and location choices offered by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub locations: Vec<String>,
}

/// Trim entries, drop blanks and repeats, keep the backend's order
fn normalise(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.to_lowercase()))
        .collect()
}

/// Case-insensitive exact match first, then the best fuzzy match
fn resolve<'a>(options: &'a [String], input: &str) -> Option<&'a str> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Some(exact) = options.iter().find(|o| o.eq_ignore_ascii_case(input)) {
        return Some(exact);
    }

    let matcher = SkimMatcherV2::default();
    options
        .iter()
        .filter_map(|o| matcher.fuzzy_match(o, input).map(|score| (score, o)))
        .max_by_key(|(score, _)| *score)
        .map(|(_, o)| o.as_str())
}

fn ranked<'a>(options: &'a [String], partial: &str) -> Vec<&'a str> {
    if partial.trim().is_empty() {
        return options.iter().map(String::as_str).collect();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &str)> = options
        .iter()
        .filter_map(|o| matcher.fuzzy_match(o, partial.trim()).map(|s| (s, o.as_str())))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, o)| o).collect()
}

impl FilterOptions {
    pub fn new(categories: Vec<String>, locations: Vec<String>) -> Self {
        Self {
            categories: normalise(categories),
            locations: normalise(locations),
        }
    }

    /// Fetch both lists. A list that fails to load is left empty and the
    /// error for it is returned alongside.
    pub async fn load(client: &ApiClient) -> (Self, Vec<ApiError>) {
        let (categories, locations) = tokio::join!(client.categories(), client.locations());
        let mut errors = Vec::new();

        let categories = categories.unwrap_or_else(|e| {
            warn!(target: "api", "Error loading categories: {}", e);
            errors.push(e);
            Vec::new()
        });
        let locations = locations.unwrap_or_else(|e| {
            warn!(target: "api", "Error loading locations: {}", e);
            errors.push(e);
            Vec::new()
        });

        let options = Self::new(categories, locations);
        info!(
            target: "api",
            "Loaded {} categories and {} locations",
            options.categories.len(),
            options.locations.len()
        );
        (options, errors)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.locations.is_empty()
    }

    pub fn resolve_category(&self, input: &str) -> Option<&str> {
        resolve(&self.categories, input)
    }

    pub fn resolve_location(&self, input: &str) -> Option<&str> {
        resolve(&self.locations, input)
    }

    pub fn suggest_categories(&self, partial: &str) -> Vec<&str> {
        ranked(&self.categories, partial)
    }

    pub fn suggest_locations(&self, partial: &str) -> Vec<&str> {
        ranked(&self.locations, partial)
    }
}
