//! # Fixed Constants
//!
//! Compile-time constants shared by the storage, persistence and export
//! layers. None of these are configurable at runtime.

/// Magic bytes for the persisted record header.
///
/// - Record Header = Magic Bytes ("DIRN") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"DIRN";

/// Current record serialization format version.
///
/// Increment this when making breaking changes to `Reflection`'s layout.
pub const FORMAT_VERSION: u8 = 1;

/// Length of the persisted record header.
pub const HEADER_LENGTH: usize = 5;

/// Maximum encoded record size accepted by the decoder (1 MiB).
pub const MAX_RECORD_PAYLOAD_SIZE: usize = 1024 * 1024;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Raw identifier length in bytes.
pub const ID_BYTES: usize = 12;

/// Identifier length in its hex text form.
pub const ID_HEX_LENGTH: usize = ID_BYTES * 2;

/// Name of the collection (redb table) holding reflections.
pub const REFLECTION_COLLECTION: &str = "reflection";

/// Name of the metadata collection (redb table).
pub const METADATA_COLLECTION: &str = "metadata";

// =============================================================================
// EMAIL LIMITS
// =============================================================================

/// Maximum total email address length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum local part (before '@') length.
pub const MAX_EMAIL_LOCAL_LENGTH: usize = 64;

/// Maximum domain part (after '@') length.
pub const MAX_EMAIL_DOMAIN_LENGTH: usize = 253;

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// Maximum number of collection names reported by diagnostics.
pub const MAX_REPORTED_COLLECTIONS: usize = 10;

/// Maximum length of an error message included in diagnostics.
pub const MAX_DIAGNOSTIC_ERROR_LENGTH: usize = 80;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"DIRN");
        assert_eq!(HEADER_LENGTH, MAGIC_BYTES.len() + 1);
    }

    #[test]
    fn id_hex_is_twice_the_bytes() {
        assert_eq!(ID_HEX_LENGTH, 24);
    }
}
