//! Store connectivity report.

use crate::primitives::{MAX_DIAGNOSTIC_ERROR_LENGTH, MAX_REPORTED_COLLECTIONS};
use crate::session::{Session, StorageBackend};
use serde::{Deserialize, Serialize};

/// Health of the underlying store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreStatus {
    /// Store opened and answered a read.
    Working,
    /// Store opened but the read failed.
    Degraded,
    /// Store was never opened.
    NotInitialized,
}

/// Snapshot of the store as seen by the running process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDiagnostics {
    /// "memory", "redb" or "unavailable".
    pub backend: String,
    pub status: StoreStatus,
    /// Database file, for persistent backends.
    pub location: Option<String>,
    /// Database name (file stem), for persistent backends.
    pub name: Option<String>,
    /// Up to `MAX_REPORTED_COLLECTIONS` collection names.
    pub collections: Vec<String>,
    pub record_count: Option<usize>,
    /// Probe or open failure, truncated.
    pub error: Option<String>,
}

impl StoreDiagnostics {
    /// Probe the session's store.
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        let (backend, location, name) = match session.backend() {
            StorageBackend::InMemory(_) => ("memory", None, None),
            StorageBackend::Persistent(store) => (
                "redb",
                Some(store.path().display().to_string()),
                store
                    .path()
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned()),
            ),
            StorageBackend::Unavailable(reason) => {
                return Self {
                    backend: "unavailable".to_string(),
                    status: StoreStatus::NotInitialized,
                    location: None,
                    name: None,
                    collections: Vec::new(),
                    record_count: None,
                    error: Some(truncate(reason)),
                };
            }
        };

        let read = session
            .collections()
            .and_then(|collections| Ok((collections, session.reflection_count()?)));

        let (status, collections, record_count, error) = match read {
            Ok((mut collections, count)) => {
                collections.truncate(MAX_REPORTED_COLLECTIONS);
                (StoreStatus::Working, collections, Some(count), None)
            }
            Err(e) => (
                StoreStatus::Degraded,
                Vec::new(),
                None,
                Some(truncate(&e.to_string())),
            ),
        };

        Self {
            backend: backend.to_string(),
            status,
            location,
            name,
            collections,
            record_count,
            error,
        }
    }
}

fn truncate(message: &str) -> String {
    message.chars().take(MAX_DIAGNOSTIC_ERROR_LENGTH).collect()
}
