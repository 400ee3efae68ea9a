//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        CreateReflectionResponse, DiagnosticsResponse, EmailRequest, EmailResponse,
        ErrorResponse, ExportQuery, HealthResponse, ReflectionRequest, ReflectionResponse,
        ReflectionSummary, RootResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use direction_core::{
    DirectionError, EmailAddress, ExportFormat, StoreDiagnostics, export_reflection,
};

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// Status code for a core error. `fallback` covers store and render failures,
/// which each endpoint reports differently.
fn status_for(err: &DirectionError, fallback: StatusCode) -> StatusCode {
    match err {
        DirectionError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
        DirectionError::NotFound(_) => StatusCode::NOT_FOUND,
        DirectionError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => fallback,
    }
}

/// Build a `{"detail": ...}` error response.
fn error_response(status: StatusCode, err: &DirectionError) -> Response {
    (status, Json(ErrorResponse::new(err.to_string()))).into_response()
}

// =============================================================================
// ROOT / HEALTH / DIAGNOSTICS
// =============================================================================

/// Liveness message.
pub async fn root_handler() -> impl IntoResponse {
    Json(RootResponse::default())
}

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Store connectivity report.
pub async fn diagnostics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let report = StoreDiagnostics::from_session(&session);

    (StatusCode::OK, Json(DiagnosticsResponse::from(report)))
}

// =============================================================================
// CREATE HANDLER
// =============================================================================

/// Derive guidance for a new reflection and store it.
pub async fn create_reflection_handler(
    State(state): State<AppState>,
    Json(request): Json<ReflectionRequest>,
) -> Response {
    let input = match request.to_input() {
        Ok(input) => input,
        Err(e) => return error_response(status_for(&e, StatusCode::BAD_REQUEST), &e),
    };

    let mut session = state.session.write().await;
    match session.create_reflection(input) {
        Ok((id, record)) => {
            tracing::info!(event = "reflection_created", id = %id, "Reflection stored");
            let response = CreateReflectionResponse {
                id: id.to_string(),
                summary: ReflectionSummary::from(&record),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!(event = "reflection_create_failed", error = %e, "Create failed");
            error_response(status_for(&e, StatusCode::INTERNAL_SERVER_ERROR), &e)
        }
    }
}

// =============================================================================
// READ HANDLER
// =============================================================================

/// Fetch a stored reflection.
pub async fn get_reflection_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let session = state.session.read().await;
    match session.get_reflection(&id) {
        Ok((id, record)) => {
            (StatusCode::OK, Json(ReflectionResponse::new(id, &record))).into_response()
        }
        Err(e) => error_response(status_for(&e, StatusCode::BAD_REQUEST), &e),
    }
}

// =============================================================================
// EMAIL HANDLER
// =============================================================================

/// Record a delivery address for a reflection. Nothing is sent.
pub async fn email_reflection_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<EmailRequest>,
) -> Response {
    let email = match EmailAddress::parse(&request.email) {
        Ok(email) => email,
        Err(e) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, &e),
    };

    let mut session = state.session.write().await;
    match session.set_email_target(&id, &email) {
        Ok(id) => {
            tracing::info!(
                event = "email_simulated",
                id = %id,
                to = %email,
                "Email scheduled (simulated)"
            );
            (StatusCode::OK, Json(EmailResponse::queued(email.as_str()))).into_response()
        }
        Err(e) => error_response(status_for(&e, StatusCode::BAD_REQUEST), &e),
    }
}

// =============================================================================
// EXPORT HANDLER
// =============================================================================

/// Render a reflection as a downloadable PDF or XLSX document.
pub async fn export_reflection_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Response {
    let format = query
        .format
        .as_deref()
        .map(ExportFormat::from_query)
        .unwrap_or_default();

    let fetched = {
        let session = state.session.read().await;
        session.get_reflection(&id)
    };
    let (id, record) = match fetched {
        Ok(found) => found,
        Err(e) => return error_response(status_for(&e, StatusCode::INTERNAL_SERVER_ERROR), &e),
    };

    match export_reflection(&id, &record, format) {
        Ok(file) => {
            let disposition = format!("attachment; filename={}", file.filename);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, file.content_type.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                file.bytes,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(event = "export_failed", id = %id, error = %e, "Export failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}
