//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, ReflectionRequest, ReflectionResponse};
use crate::config::{SecurityConfig, ServerConfig, StorageConfig};
use direction_core::{
    DirectionError, EmailAddress, ExportFormat, Session, StoreDiagnostics, export_reflection,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Maximum size of a reflection input file (1 MB).
const MAX_INPUT_FILE_SIZE: u64 = 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), DirectionError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| DirectionError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(DirectionError::Validation(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, DirectionError> {
    let canonical = path.canonicalize().map_err(|e| {
        DirectionError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(DirectionError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent of an output path and require a directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, DirectionError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        DirectionError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(DirectionError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| DirectionError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Pretty-print a serializable value.
fn print_json(value: &impl serde::Serialize) -> Result<(), DirectionError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| DirectionError::Serialization(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
///
/// A store that fails to open does not stop the server: it starts with an
/// unavailable backend and reports the failure on `/test`.
pub async fn cmd_server(
    storage: &StorageConfig,
    server: &ServerConfig,
    security: &SecurityConfig,
) -> Result<(), DirectionError> {
    let session = match open_session(storage) {
        Ok(session) => session,
        Err(e @ DirectionError::StorageUnavailable(_)) => {
            tracing::error!(
                event = "store_unavailable",
                error = %e,
                "Starting without a store; reflection endpoints will fail"
            );
            Session::unavailable(e.to_string())
        }
        Err(e) => return Err(e),
    };

    println!("Direction Companion Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", server.host);
    println!("  Port:     {}", server.port);
    println!("  Backend:  {}", storage.backend);
    println!("  Database: {:?}", storage.path);
    println!();
    println!("Endpoints:");
    println!("  GET  /                             - Liveness message");
    println!("  GET  /health                       - Health check");
    println!("  GET  /test                         - Store diagnostics");
    println!("  POST /api/reflections              - Create a reflection");
    println!("  GET  /api/reflections/{{id}}         - Fetch a reflection");
    println!("  POST /api/reflections/{{id}}/email   - Record email target");
    println!("  GET  /api/reflections/{{id}}/export  - Download PDF/XLSX");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", server.host, server.port);
    api::run_server(&addr, session, security).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create an empty database file.
pub fn cmd_init(storage: &StorageConfig, force: bool) -> Result<(), DirectionError> {
    if storage.backend == "memory" {
        println!("Memory backend selected; nothing to initialize");
        return Ok(());
    }

    if storage.path.exists() {
        if !force {
            return Err(DirectionError::Validation(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(&storage.path)
            .map_err(|e| DirectionError::Io(format!("Remove old database: {}", e)))?;
    }

    let _session = open_session(storage)?;
    println!("Initialized new redb database at {:?}", storage.path);
    Ok(())
}

// =============================================================================
// CREATE COMMAND
// =============================================================================

/// Create a reflection from a JSON file holding the five answers.
pub fn cmd_create(
    storage: &StorageConfig,
    json_mode: bool,
    file: &Path,
) -> Result<(), DirectionError> {
    let path = validate_file_path(file)?;
    validate_file_size(&path, MAX_INPUT_FILE_SIZE)?;

    let data = std::fs::read(&path)
        .map_err(|e| DirectionError::Io(format!("Read input: {}", e)))?;
    let request: ReflectionRequest = serde_json::from_slice(&data)
        .map_err(|e| DirectionError::Serialization(format!("Invalid input JSON: {}", e)))?;

    let mut session = open_session(storage)?;
    if !session.is_persistent() {
        tracing::warn!("Memory backend: the new reflection is discarded on exit");
    }

    let (id, record) = session.create_reflection(request.to_input()?)?;
    let response = ReflectionResponse::new(id, &record);

    if json_mode {
        return print_json(&response);
    }

    println!("Created reflection {}", id);
    println!();
    print_reflection(&response);
    Ok(())
}

// =============================================================================
// SHOW COMMAND
// =============================================================================

/// Print a stored reflection.
pub fn cmd_show(storage: &StorageConfig, json_mode: bool, id: &str) -> Result<(), DirectionError> {
    let session = open_session(storage)?;
    let (id, record) = session.get_reflection(id)?;
    let response = ReflectionResponse::new(id, &record);

    if json_mode {
        return print_json(&response);
    }

    println!("Reflection {}", id);
    println!();
    print_reflection(&response);
    Ok(())
}

fn print_reflection(response: &ReflectionResponse) {
    let summary = &response.summary;
    println!("Feeling:         {}", summary.feeling);
    println!("Area:            {}", summary.area);
    println!("Challenge:       {}", summary.challenge);
    println!("Desired Outcome: {}", summary.desired_outcome);
    println!("Timeline:        {}", summary.action_timeline);
    println!();
    println!("{}", summary.distilled);
    println!();
    println!("Guidance:");
    for line in &summary.guidance {
        println!("  - {}", line);
    }
    println!();
    println!("{}", summary.message);
    if let Some(to) = &summary.emailed_to {
        println!();
        println!("Emailed to: {}", to);
    }
    println!();
    println!("Created: {}", response.created_at);
    println!("Updated: {}", response.updated_at);
}

// =============================================================================
// EMAIL COMMAND
// =============================================================================

/// Record an email target. No message is sent.
pub fn cmd_email(
    storage: &StorageConfig,
    json_mode: bool,
    id: &str,
    address: &str,
) -> Result<(), DirectionError> {
    let email = EmailAddress::parse(address)?;
    let mut session = open_session(storage)?;
    let id = session.set_email_target(id, &email)?;

    if json_mode {
        return print_json(&crate::api::EmailResponse::queued(email.as_str()));
    }

    println!("Email scheduled (simulated) for reflection {} to {}", id, email);
    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Render a reflection to a PDF or XLSX file.
pub fn cmd_export(
    storage: &StorageConfig,
    id: &str,
    format: &str,
    output: Option<&Path>,
) -> Result<(), DirectionError> {
    let session = open_session(storage)?;
    let (id, record) = session.get_reflection(id)?;
    let file = export_reflection(&id, &record, ExportFormat::from_query(format))?;

    let target = output.map_or_else(|| PathBuf::from(&file.filename), Path::to_path_buf);
    let target = validate_output_path(&target)?;

    std::fs::write(&target, &file.bytes)
        .map_err(|e| DirectionError::Io(format!("Write export: {}", e)))?;

    println!(
        "Exported reflection {} ({}, {} bytes) to {:?}",
        id,
        file.content_type,
        file.bytes.len(),
        target
    );
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show store diagnostics.
pub fn cmd_status(storage: &StorageConfig, json_mode: bool) -> Result<(), DirectionError> {
    let session = match open_session(storage) {
        Ok(session) => session,
        Err(e @ DirectionError::StorageUnavailable(_)) => Session::unavailable(e.to_string()),
        Err(e) => return Err(e),
    };
    let report = StoreDiagnostics::from_session(&session);

    if json_mode {
        return print_json(&report);
    }

    println!("Direction Companion Store Status");
    println!("================================");
    println!("Backend:     {}", report.backend);
    println!("Status:      {:?}", report.status);
    if let Some(location) = &report.location {
        println!("Location:    {}", location);
    }
    if let Some(count) = report.record_count {
        println!("Reflections: {}", count);
    }
    if !report.collections.is_empty() {
        println!("Collections: {}", report.collections.join(", "));
    }
    if let Some(error) = &report.error {
        println!("Error:       {}", error);
    }

    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open a session for the configured backend.
pub fn open_session(storage: &StorageConfig) -> Result<Session, DirectionError> {
    match storage.backend.as_str() {
        "redb" => Session::with_redb(&storage.path),
        "memory" => Ok(Session::new()),
        other => Err(DirectionError::Config(format!(
            "Unknown storage backend '{}' (expected \"redb\" or \"memory\")",
            other
        ))),
    }
}

// =============================================================================
// TESTS
// =============================================================================
