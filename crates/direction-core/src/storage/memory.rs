//! # In-Memory Reflection Store
//!
//! A `BTreeMap`-backed store. Nothing survives the process.

use super::{ReflectionStore, mint_id};
use crate::primitives::REFLECTION_COLLECTION;
use crate::{DirectionError, EmailAddress, Reflection, ReflectionId};
use std::collections::BTreeMap;

/// Volatile reflection store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<ReflectionId, Reflection>,
    next_sequence: u64,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReflectionStore for MemoryStore {
    fn insert(&mut self, reflection: &Reflection) -> Result<ReflectionId, DirectionError> {
        let id = mint_id(reflection.created_at_ms, self.next_sequence);
        self.next_sequence = self.next_sequence.saturating_add(1);
        self.records.insert(id, reflection.clone());
        Ok(id)
    }

    fn get(&self, id: ReflectionId) -> Result<Option<Reflection>, DirectionError> {
        Ok(self.records.get(&id).cloned())
    }

    fn set_emailed_to(
        &mut self,
        id: ReflectionId,
        email: &EmailAddress,
        now_ms: i64,
    ) -> Result<bool, DirectionError> {
        match self.records.get_mut(&id) {
            Some(record) => {
                record.mark_emailed(email, now_ms);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn count(&self) -> Result<usize, DirectionError> {
        Ok(self.records.len())
    }

    fn collections(&self) -> Result<Vec<String>, DirectionError> {
        if self.records.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(vec![REFLECTION_COLLECTION.to_string()])
        }
    }
}
