//! # redb-backed Reflection Storage
//!
//! A disk-backed reflection store using the redb embedded database, providing:
//! - ACID transactions (every insert and update is a single write transaction)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Records are stored as persistence-format bytes keyed by the 12 raw
//! identifier bytes. The next sequence number lives in the metadata table.

use super::{ReflectionStore, mint_id};
use crate::formats::{reflection_from_bytes, reflection_to_bytes};
use crate::primitives::{METADATA_COLLECTION, REFLECTION_COLLECTION};
use crate::{DirectionError, EmailAddress, Reflection, ReflectionId};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition, TableHandle,
};
use std::path::{Path, PathBuf};

/// Table for reflections: raw id bytes -> encoded record
const REFLECTIONS: TableDefinition<&[u8], &[u8]> = TableDefinition::new(REFLECTION_COLLECTION);

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new(METADATA_COLLECTION);

const NEXT_SEQUENCE_KEY: &str = "next_sequence";

fn storage_err(e: impl std::fmt::Display) -> DirectionError {
    DirectionError::Storage(e.to_string())
}

/// A disk-backed reflection store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
    /// Location of the database file.
    path: PathBuf,
    /// Next sequence number, mirrored from the metadata table.
    next_sequence: u64,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("path", &self.path)
            .field("next_sequence", &self.next_sequence)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a reflection database at the given path.
    ///
    /// Failure to open the file is reported as `StorageUnavailable`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DirectionError> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path).map_err(|e| {
            DirectionError::StorageUnavailable(format!("{}: {}", path.display(), e))
        })?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(storage_err)?;
            let _ = write_txn.open_table(REFLECTIONS).map_err(storage_err)?;
            let _ = write_txn.open_table(METADATA).map_err(storage_err)?;
            write_txn.commit().map_err(storage_err)?;
        }

        let next_sequence = {
            let read_txn = db.begin_read().map_err(storage_err)?;
            let table = read_txn.open_table(METADATA).map_err(storage_err)?;
            table
                .get(NEXT_SEQUENCE_KEY)
                .map_err(storage_err)?
                .map(|v| v.value())
                .unwrap_or(0)
        };

        Ok(Self {
            db,
            path,
            next_sequence,
        })
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReflectionStore for RedbStore {
    fn insert(&mut self, reflection: &Reflection) -> Result<ReflectionId, DirectionError> {
        let encoded = reflection_to_bytes(reflection)?;
        let id = mint_id(reflection.created_at_ms, self.next_sequence);
        let following = self.next_sequence.saturating_add(1);

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut records = write_txn.open_table(REFLECTIONS).map_err(storage_err)?;
            let mut meta = write_txn.open_table(METADATA).map_err(storage_err)?;

            records
                .insert(id.as_bytes().as_slice(), encoded.as_slice())
                .map_err(storage_err)?;
            meta.insert(NEXT_SEQUENCE_KEY, following)
                .map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;

        // Update in-memory state only after successful commit.
        self.next_sequence = following;
        Ok(id)
    }

    fn get(&self, id: ReflectionId) -> Result<Option<Reflection>, DirectionError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let records = read_txn.open_table(REFLECTIONS).map_err(storage_err)?;

        let guard = records
            .get(id.as_bytes().as_slice())
            .map_err(storage_err)?;
        guard
            .map(|data| reflection_from_bytes(data.value()))
            .transpose()
    }

    fn set_emailed_to(
        &mut self,
        id: ReflectionId,
        email: &EmailAddress,
        now_ms: i64,
    ) -> Result<bool, DirectionError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        let updated = {
            let mut records = write_txn.open_table(REFLECTIONS).map_err(storage_err)?;

            let existing = records
                .get(id.as_bytes().as_slice())
                .map_err(storage_err)?
                .map(|data| reflection_from_bytes(data.value()))
                .transpose()?;

            match existing {
                Some(mut record) => {
                    record.mark_emailed(email, now_ms);
                    let encoded = reflection_to_bytes(&record)?;
                    records
                        .insert(id.as_bytes().as_slice(), encoded.as_slice())
                        .map_err(storage_err)?;
                    true
                }
                None => false,
            }
        };

        if updated {
            write_txn.commit().map_err(storage_err)?;
        } else {
            write_txn.abort().map_err(storage_err)?;
        }
        Ok(updated)
    }

    fn count(&self) -> Result<usize, DirectionError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let records = read_txn.open_table(REFLECTIONS).map_err(storage_err)?;
        let len = records.len().map_err(storage_err)?;
        Ok(len as usize)
    }

    fn collections(&self) -> Result<Vec<String>, DirectionError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let mut names: Vec<String> = read_txn
            .list_tables()
            .map_err(storage_err)?
            .map(|handle| handle.name().to_string())
            .collect();
        names.sort();
        Ok(names)
    }
}

// =============================================================================
// TESTS
// =============================================================================
