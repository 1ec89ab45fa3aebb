//! Lead-generation forms: service quote requests and professional sign-ups
//!
//! Both forms are validated locally before anything is sent, so the backend
//! only ever sees complete submissions.

use chrono::{Local, NaiveDate};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::sync::LazyLock;
use tracing::info;

use crate::api::ApiClient;
use crate::error::{ApiError, ValidationError};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

fn require_email(value: &str) -> Result<(), ValidationError> {
    require("email", value)?;
    if !EMAIL_PATTERN.is_match(value.trim()) {
        return Err(ValidationError::InvalidEmail(value.trim().to_string()));
    }
    Ok(())
}

/// The backend takes multi-selects as one comma separated field; blank
/// entries are dropped
fn join_selection<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    let joined = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    serializer.serialize_str(&joined)
}

/// Request for a quote from a listed business or for a service in general
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuoteRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    pub location: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_date: Option<NaiveDate>,
}

impl QuoteRequest {
    /// Check required fields, the email shape and that the date is not before `today`
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require_email(&self.email)?;
        require("phone", &self.phone)?;
        require("service", &self.service)?;
        require("location", &self.location)?;
        require("description", &self.description)?;

        if let Some(date) = self.preferred_date {
            if date < today {
                return Err(ValidationError::DateInPast(date));
            }
        }
        Ok(())
    }
}

/// Application from a professional to be listed in the directory
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfessionalRegistration {
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "service", serialize_with = "join_selection")]
    pub services: Vec<String>,
    #[serde(rename = "location", serialize_with = "join_selection")]
    pub locations: Vec<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance: Option<String>,
}

impl ProfessionalRegistration {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("company", &self.company)?;
        require_email(&self.email)?;
        require("phone", &self.phone)?;

        if self.services.iter().all(|s| s.trim().is_empty()) {
            return Err(ValidationError::EmptySelection("services"));
        }
        if self.locations.iter().all(|l| l.trim().is_empty()) {
            return Err(ValidationError::EmptySelection("locations"));
        }

        require("description", &self.description)
    }
}

/// Validates and submits lead forms
pub struct LeadFormService {
    client: ApiClient,
}

impl LeadFormService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn submit_quote(&self, request: &QuoteRequest) -> Result<String, ApiError> {
        request.validate(Local::now().date_naive())?;
        let message = self.client.submit_quote(request).await?;
        info!(
            target: "forms",
            "Quote request submitted for '{}' in '{}'", request.service, request.location
        );
        Ok(message)
    }

    pub async fn register_professional(
        &self,
        registration: &ProfessionalRegistration,
    ) -> Result<String, ApiError> {
        registration.validate()?;
        let message = self.client.register_professional(registration).await?;
        info!(target: "forms", "Registration submitted for '{}'", registration.company);
        Ok(message)
    }
}
