//! # Session Module
//!
//! The explicit store handle the service passes into every operation.
//!
//! A `Session` owns exactly one storage backend for its whole lifetime:
//! opened at process start, dropped at shutdown. It is the only way the
//! rest of the system touches stored reflections.
//!
//! ## Storage Backends
//!
//! - `InMemory`: `MemoryStore` (fast, volatile)
//! - `Persistent`: `RedbStore` (disk-backed ACID storage)
//! - `Unavailable`: the store could not be opened; every operation fails
//!   with `StorageUnavailable`, diagnostics still work

use crate::guidance;
use crate::storage::{MemoryStore, RedbStore, ReflectionStore};
use crate::{DirectionError, EmailAddress, Reflection, ReflectionId, ReflectionInput};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in unix milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Storage backend for a Session.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory store (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
    /// The configured store could not be opened.
    Unavailable(String),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

/// Handle to the reflection store plus the operations built on it.
///
/// Note: Session does NOT implement Clone; the redb handle cannot be
/// duplicated. Share it behind a lock instead.
#[derive(Debug, Default)]
pub struct Session {
    backend: StorageBackend,
}

impl Session {
    /// Create a new session with an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with persistent redb storage.
    ///
    /// Opens or creates a redb database at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, DirectionError> {
        let store = RedbStore::open(path)?;
        Ok(Self {
            backend: StorageBackend::Persistent(store),
        })
    }

    /// Create a session whose store failed to open.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            backend: StorageBackend::Unavailable(reason.into()),
        }
    }

    /// The active backend.
    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    fn store(&self) -> Result<&dyn ReflectionStore, DirectionError> {
        match &self.backend {
            StorageBackend::InMemory(store) => Ok(store),
            StorageBackend::Persistent(store) => Ok(store),
            StorageBackend::Unavailable(reason) => {
                Err(DirectionError::StorageUnavailable(reason.clone()))
            }
        }
    }

    fn store_mut(&mut self) -> Result<&mut dyn ReflectionStore, DirectionError> {
        match &mut self.backend {
            StorageBackend::InMemory(store) => Ok(store),
            StorageBackend::Persistent(store) => Ok(store),
            StorageBackend::Unavailable(reason) => {
                Err(DirectionError::StorageUnavailable(reason.clone()))
            }
        }
    }

    // =========================================================================
    // REFLECTION OPERATIONS
    // =========================================================================

    /// Derive guidance for `input` and persist the combined record.
    pub fn create_reflection(
        &mut self,
        input: ReflectionInput,
    ) -> Result<(ReflectionId, Reflection), DirectionError> {
        self.create_reflection_at(input, now_millis())
    }

    /// Same as `create_reflection` with an explicit creation time.
    pub fn create_reflection_at(
        &mut self,
        input: ReflectionInput,
        now_ms: i64,
    ) -> Result<(ReflectionId, Reflection), DirectionError> {
        let store = self.store_mut()?;
        let derived = guidance::derive(&input);
        let record = Reflection::from_parts(input, derived, now_ms);
        let id = store.insert(&record)?;
        Ok((id, record))
    }

    /// Fetch a stored reflection by its text identifier.
    pub fn get_reflection(&self, id: &str) -> Result<(ReflectionId, Reflection), DirectionError> {
        let id = ReflectionId::parse(id)?;
        let record = self.store()?.get(id)?.ok_or(DirectionError::NotFound(id))?;
        Ok((id, record))
    }

    /// Record `email` as the (simulated) delivery target of a reflection.
    pub fn set_email_target(
        &mut self,
        id: &str,
        email: &EmailAddress,
    ) -> Result<ReflectionId, DirectionError> {
        self.set_email_target_at(id, email, now_millis())
    }

    /// Same as `set_email_target` with an explicit update time.
    pub fn set_email_target_at(
        &mut self,
        id: &str,
        email: &EmailAddress,
        now_ms: i64,
    ) -> Result<ReflectionId, DirectionError> {
        let id = ReflectionId::parse(id)?;
        if self.store_mut()?.set_emailed_to(id, email, now_ms)? {
            Ok(id)
        } else {
            Err(DirectionError::NotFound(id))
        }
    }

    /// Number of stored reflections.
    pub fn reflection_count(&self) -> Result<usize, DirectionError> {
        self.store()?.count()
    }

    /// Collection names of the active store.
    pub fn collections(&self) -> Result<Vec<String>, DirectionError> {
        self.store()?.collections()
    }
}

// =============================================================================
// TESTS
// =============================================================================
