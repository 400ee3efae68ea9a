//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use chrono::{DateTime, SecondsFormat, Utc};
use direction_core::{
    DirectionError, Reflection, ReflectionId, ReflectionInput, StoreDiagnostics, StoreStatus,
};
use serde::{Deserialize, Serialize};

/// Upper bound on a single answer, in bytes.
pub const MAX_ANSWER_LENGTH: usize = 4096;

// =============================================================================
// ROOT / HEALTH RESPONSES
// =============================================================================

/// Liveness message served at `/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

impl Default for RootResponse {
    fn default() -> Self {
        Self {
            message: "Direction Companion API is running".to_string(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// DIAGNOSTICS RESPONSE
// =============================================================================

/// Store connectivity report served at `/test`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsResponse {
    /// Always "running" when this handler answers.
    pub backend: String,
    /// Human-readable store state.
    pub database: String,
    pub database_path: Option<String>,
    pub database_name: Option<String>,
    /// "Connected" or "Not Connected".
    pub connection_status: String,
    pub collections: Vec<String>,
    /// Which store is in use: "memory", "redb" or "unavailable".
    pub store: String,
    pub record_count: Option<usize>,
}

impl From<StoreDiagnostics> for DiagnosticsResponse {
    fn from(report: StoreDiagnostics) -> Self {
        let database = match (&report.status, &report.error) {
            (StoreStatus::Working, _) => "connected and working".to_string(),
            (StoreStatus::Degraded, Some(e)) => format!("connected but error: {}", e),
            (StoreStatus::Degraded, None) => "connected but error".to_string(),
            (StoreStatus::NotInitialized, Some(e)) => format!("not initialized: {}", e),
            (StoreStatus::NotInitialized, None) => "not initialized".to_string(),
        };
        let connection_status = match report.status {
            StoreStatus::NotInitialized => "Not Connected",
            StoreStatus::Working | StoreStatus::Degraded => "Connected",
        };

        Self {
            backend: "running".to_string(),
            database,
            database_path: report.location,
            database_name: report.name,
            connection_status: connection_status.to_string(),
            collections: report.collections,
            store: report.backend,
            record_count: report.record_count,
        }
    }
}

// =============================================================================
// REFLECTION REQUEST
// =============================================================================

/// Body of `POST /api/reflections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionRequest {
    pub feeling: String,
    pub area: String,
    pub challenge: String,
    pub desired_outcome: String,
    pub action_timeline: String,
}

impl ReflectionRequest {
    /// Convert to core input, bounding each answer's size.
    ///
    /// Empty answers are accepted; the guidance engine is total.
    pub fn to_input(&self) -> Result<ReflectionInput, DirectionError> {
        let answers = [
            ("feeling", &self.feeling),
            ("area", &self.area),
            ("challenge", &self.challenge),
            ("desired_outcome", &self.desired_outcome),
            ("action_timeline", &self.action_timeline),
        ];
        for (name, value) in answers {
            if value.len() > MAX_ANSWER_LENGTH {
                return Err(DirectionError::Validation(format!(
                    "{} length {} exceeds maximum {} bytes",
                    name,
                    value.len(),
                    MAX_ANSWER_LENGTH
                )));
            }
        }

        Ok(ReflectionInput::new(
            self.feeling.as_str(),
            self.area.as_str(),
            self.challenge.as_str(),
            self.desired_outcome.as_str(),
            self.action_timeline.as_str(),
        ))
    }
}

// =============================================================================
// REFLECTION RESPONSES
// =============================================================================

/// The answers plus generated fields, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionSummary {
    pub feeling: String,
    pub area: String,
    pub challenge: String,
    pub desired_outcome: String,
    pub action_timeline: String,
    pub distilled: String,
    pub guidance: Vec<String>,
    pub message: String,
    pub emailed_to: Option<String>,
}

impl From<&Reflection> for ReflectionSummary {
    fn from(record: &Reflection) -> Self {
        Self {
            feeling: record.feeling.clone(),
            area: record.area.clone(),
            challenge: record.challenge.clone(),
            desired_outcome: record.desired_outcome.clone(),
            action_timeline: record.action_timeline.clone(),
            distilled: record.distilled.clone(),
            guidance: record.guidance.clone(),
            message: record.message.clone(),
            emailed_to: record.emailed_to.clone(),
        }
    }
}

/// Response of `POST /api/reflections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReflectionResponse {
    pub id: String,
    pub summary: ReflectionSummary,
}

/// Response of `GET /api/reflections/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionResponse {
    pub id: String,
    #[serde(flatten)]
    pub summary: ReflectionSummary,
    /// RFC 3339, UTC.
    pub created_at: String,
    /// RFC 3339, UTC.
    pub updated_at: String,
}

impl ReflectionResponse {
    #[must_use]
    pub fn new(id: ReflectionId, record: &Reflection) -> Self {
        Self {
            id: id.to_string(),
            summary: ReflectionSummary::from(record),
            created_at: format_timestamp(record.created_at_ms),
            updated_at: format_timestamp(record.updated_at_ms),
        }
    }
}

/// Render unix milliseconds as RFC 3339 with millisecond precision.
///
/// Out-of-range values fall back to the epoch.
#[must_use]
pub fn format_timestamp(unix_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(unix_ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

// =============================================================================
// EMAIL REQUEST/RESPONSE
// =============================================================================

/// Body of `POST /api/reflections/{id}/email`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

/// Acknowledgement of a (simulated) email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailResponse {
    pub status: String,
    pub message: String,
    pub to: String,
}

impl EmailResponse {
    #[must_use]
    pub fn queued(to: impl Into<String>) -> Self {
        Self {
            status: "queued".to_string(),
            message: "Email scheduled (simulated)".to_string(),
            to: to.into(),
        }
    }
}

// =============================================================================
// EXPORT QUERY / ERRORS
// =============================================================================

/// Query string of the export endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportQuery {
    /// "pdf" (default) or "xlsx"; anything else renders PDF.
    pub format: Option<String>,
}

/// Error body for every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
