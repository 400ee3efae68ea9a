//! # Reflection Storage
//!
//! The `ReflectionStore` trait and its two backends:
//! - `MemoryStore`: volatile, for tests and throwaway servers
//! - `RedbStore`: disk-backed ACID storage using redb
//!
//! Stores only persist what they are given. Deriving guidance and stamping
//! timestamps happens in `Session`.

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::{DirectionError, EmailAddress, Reflection, ReflectionId};

/// Document-store operations needed by the service.
pub trait ReflectionStore {
    /// Insert a fully populated record and return its fresh identifier.
    fn insert(&mut self, reflection: &Reflection) -> Result<ReflectionId, DirectionError>;

    /// Fetch a record by identifier.
    fn get(&self, id: ReflectionId) -> Result<Option<Reflection>, DirectionError>;

    /// Set `emailed_to` and `updated_at`. Returns `false` if no record has `id`.
    fn set_emailed_to(
        &mut self,
        id: ReflectionId,
        email: &EmailAddress,
        now_ms: i64,
    ) -> Result<bool, DirectionError>;

    /// Number of stored reflections.
    fn count(&self) -> Result<usize, DirectionError>;

    /// Names of the collections backing this store, sorted.
    fn collections(&self) -> Result<Vec<String>, DirectionError>;
}

/// Mint the identifier for a record created at `created_at_ms` with the
/// store's next sequence number.
pub(crate) fn mint_id(created_at_ms: i64, sequence: u64) -> ReflectionId {
    let seconds = u32::try_from(created_at_ms.div_euclid(1000)).unwrap_or(0);
    ReflectionId::from_parts(seconds, sequence)
}
