//! # Persistence Format
//!
//! Binary serialization for stored reflections.
//!
//! Format: Header (5 bytes) + postcard-serialized `Reflection`.
//! - 4 bytes: Magic ("DIRN")
//! - 1 byte: Version
//!
//! Size and header checks run before the payload is deserialized.

use crate::{DirectionError, Reflection, primitives};

// =============================================================================
// RECORD HEADER
// =============================================================================

/// The persistence header precedes every encoded record.
#[derive(Debug, Clone, Copy)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), DirectionError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(DirectionError::Serialization(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(DirectionError::Serialization(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; primitives::HEADER_LENGTH] {
        let mut bytes = [0u8; primitives::HEADER_LENGTH];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DirectionError> {
        if bytes.len() < primitives::HEADER_LENGTH {
            return Err(DirectionError::Serialization(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a reflection to bytes (header + payload).
pub fn reflection_to_bytes(reflection: &Reflection) -> Result<Vec<u8>, DirectionError> {
    let header = PersistenceHeader::new();

    let payload = postcard::to_stdvec(reflection)
        .map_err(|e| DirectionError::Serialization(e.to_string()))?;

    let mut result = Vec::with_capacity(primitives::HEADER_LENGTH + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);

    Ok(result)
}

/// Deserialize a reflection from bytes.
///
/// Checks minimum size, maximum size, then the header, before touching
/// the payload.
pub fn reflection_from_bytes(bytes: &[u8]) -> Result<Reflection, DirectionError> {
    if bytes.len() < primitives::HEADER_LENGTH {
        return Err(DirectionError::Serialization(format!(
            "Data too short: minimum {} bytes required",
            primitives::HEADER_LENGTH
        )));
    }

    if bytes.len() > primitives::MAX_RECORD_PAYLOAD_SIZE {
        return Err(DirectionError::Serialization(format!(
            "Record size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            primitives::MAX_RECORD_PAYLOAD_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = &bytes[primitives::HEADER_LENGTH..];
    postcard::from_bytes(payload).map_err(|e| {
        DirectionError::Serialization(format!("Failed to deserialize reflection: {}", e))
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ReflectionInput, guidance};

    fn sample() -> Reflection {
        let input = ReflectionInput::new("hopeful", "purpose", "scattered", "focus", "today");
        let derived = guidance::derive(&input);
        Reflection::from_parts(input, derived, 1_700_000_000_000)
    }

    #[test]
    fn header_roundtrip() {
        let header = PersistenceHeader::new();
        let bytes = header.to_bytes();
        let restored = PersistenceHeader::from_bytes(&bytes).expect("parse header");

        assert_eq!(restored.magic, *primitives::MAGIC_BYTES);
        assert_eq!(restored.version, primitives::FORMAT_VERSION);
    }

    #[test]
    fn bytes_roundtrip_bit_exact() {
        let record = sample();

        let bytes1 = reflection_to_bytes(&record).expect("first serialize");
        let restored = reflection_from_bytes(&bytes1).expect("deserialize");
        let bytes2 = reflection_to_bytes(&restored).expect("second serialize");

        assert_eq!(restored, record);
        assert_eq!(
            bytes1, bytes2,
            "save -> load -> save must produce identical bytes"
        );
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = reflection_to_bytes(&sample()).expect("serialize");
        bytes[0..4].copy_from_slice(b"XXXX");

        assert!(reflection_from_bytes(&bytes).is_err());
    }

    #[test]
    fn future_version_rejected() {
        let mut bytes = reflection_to_bytes(&sample()).expect("serialize");
        bytes[4] = primitives::FORMAT_VERSION + 1;

        let err = reflection_from_bytes(&bytes).expect_err("version mismatch");
        assert!(err.to_string().contains("Unsupported version"));
    }

    #[test]
    fn truncated_payload_rejected() {
        let bytes = reflection_to_bytes(&sample()).expect("serialize");
        assert!(reflection_from_bytes(&bytes[..3]).is_err());
        assert!(reflection_from_bytes(&bytes[..bytes.len() / 2]).is_err());
    }
}
