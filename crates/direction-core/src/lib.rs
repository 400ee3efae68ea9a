//! # direction-core
//!
//! The logic of the Direction Companion service.
//!
//! A reflection is a five-answer self-report questionnaire. This crate
//! derives guidance from it, stores it, and renders it for download.
//!
//! ```text
//! ReflectionInput ──► guidance::derive ──► Reflection ──► Session (store)
//!                                                             │
//!                              export::export_reflection ◄────┘
//! ```
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies (pure Rust)
//! - The guidance engine is pure and total
//! - All store access goes through an explicit `Session`; there is no
//!   global store handle

// =============================================================================
// MODULES
// =============================================================================

pub mod export;
pub mod formats;
pub mod guidance;
pub mod primitives;
pub mod session;
pub mod storage;
pub mod system;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    DerivedGuidance, DirectionError, EmailAddress, Reflection, ReflectionId, ReflectionInput,
};

// =============================================================================
// RE-EXPORTS: Engine, Storage, Export
// =============================================================================

pub use export::{ExportFormat, ExportedFile, export_reflection, summary_fields};
pub use guidance::derive;
pub use session::{Session, StorageBackend};
pub use storage::{MemoryStore, RedbStore, ReflectionStore};

// =============================================================================
// RE-EXPORTS: Formats and System
// =============================================================================

pub use formats::{PersistenceHeader, reflection_from_bytes, reflection_to_bytes};
pub use system::{StoreDiagnostics, StoreStatus};
