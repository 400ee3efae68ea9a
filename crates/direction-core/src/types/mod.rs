//! # Core Type Definitions
//!
//! This module contains all core types for the Direction Companion service:
//! - Record identifiers (`ReflectionId`)
//! - Questionnaire input and the persisted record (`ReflectionInput`, `Reflection`)
//! - Engine output (`DerivedGuidance`)
//! - Validated email targets (`EmailAddress`)
//! - Error types (`DirectionError`)
//!
//! ## Identifier Shape
//!
//! A `ReflectionId` is 12 bytes rendered as 24 lowercase hex characters:
//! 4 bytes of big-endian unix seconds followed by an 8-byte big-endian
//! per-store sequence number.

use crate::primitives::{
    ID_BYTES, ID_HEX_LENGTH, MAX_EMAIL_DOMAIN_LENGTH, MAX_EMAIL_LENGTH, MAX_EMAIL_LOCAL_LENGTH,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// REFLECTION IDENTIFIER
// =============================================================================

/// Opaque identifier of a stored reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReflectionId([u8; ID_BYTES]);

impl ReflectionId {
    /// Build an identifier from a creation timestamp and a store sequence number.
    #[must_use]
    pub fn from_parts(unix_seconds: u32, sequence: u64) -> Self {
        let mut bytes = [0u8; ID_BYTES];
        bytes[0..4].copy_from_slice(&unix_seconds.to_be_bytes());
        bytes[4..12].copy_from_slice(&sequence.to_be_bytes());
        Self(bytes)
    }

    /// Rebuild an identifier from its raw key bytes.
    ///
    /// Returns `None` if the slice is not exactly 12 bytes long.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; ID_BYTES] = bytes.try_into().ok()?;
        Some(Self(raw))
    }

    /// Parse the 24-character hex form.
    ///
    /// Both cases are accepted; anything else is `InvalidIdentifier`.
    pub fn parse(s: &str) -> Result<Self, DirectionError> {
        let invalid = || DirectionError::InvalidIdentifier(s.to_string());

        if s.len() != ID_HEX_LENGTH || !s.is_ascii() {
            return Err(invalid());
        }

        let mut bytes = [0u8; ID_BYTES];
        for (slot, pair) in bytes.iter_mut().zip(s.as_bytes().chunks_exact(2)) {
            let hi = hex_value(pair[0]).ok_or_else(invalid)?;
            let lo = hex_value(pair[1]).ok_or_else(invalid)?;
            *slot = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }

    /// Raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; ID_BYTES] {
        &self.0
    }

    /// Creation time (unix seconds) embedded in the identifier.
    #[must_use]
    pub fn timestamp_secs(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Store sequence number embedded in the identifier.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        let mut seq = [0u8; 8];
        seq.copy_from_slice(&self.0[4..12]);
        u64::from_be_bytes(seq)
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for ReflectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for ReflectionId {
    type Err = DirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================================
// QUESTIONNAIRE INPUT
// =============================================================================

/// The five free-text answers of a reflection questionnaire.
///
/// Empty strings are accepted; the engine handles them like any other text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionInput {
    /// How the user is feeling right now.
    pub feeling: String,
    /// Area of life needing direction (e.g. "career").
    pub area: String,
    /// Main challenge or confusion.
    pub challenge: String,
    /// What clarity they hope to receive.
    pub desired_outcome: String,
    /// How soon they want to take action.
    pub action_timeline: String,
}

impl ReflectionInput {
    #[must_use]
    pub fn new(
        feeling: impl Into<String>,
        area: impl Into<String>,
        challenge: impl Into<String>,
        desired_outcome: impl Into<String>,
        action_timeline: impl Into<String>,
    ) -> Self {
        Self {
            feeling: feeling.into(),
            area: area.into(),
            challenge: challenge.into(),
            desired_outcome: desired_outcome.into(),
            action_timeline: action_timeline.into(),
        }
    }
}

// =============================================================================
// DERIVED GUIDANCE
// =============================================================================

/// Output of the guidance rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedGuidance {
    /// Template-filled restatement of the inputs.
    pub distilled: String,
    /// Ordered suggestions; the timeline nudge is always last.
    pub guidance: Vec<String>,
    /// One uplifting line chosen from the feeling.
    pub message: String,
}

// =============================================================================
// REFLECTION RECORD
// =============================================================================

/// A persisted reflection: the original answers plus generated fields.
///
/// Generated fields are fixed at creation. Only `emailed_to` and
/// `updated_at` change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub feeling: String,
    pub area: String,
    pub challenge: String,
    pub desired_outcome: String,
    pub action_timeline: String,
    pub distilled: String,
    pub guidance: Vec<String>,
    pub message: String,
    /// Destination address recorded by the (simulated) email operation.
    pub emailed_to: Option<String>,
    /// Creation time, unix milliseconds (UTC).
    pub created_at_ms: i64,
    /// Last modification time, unix milliseconds (UTC).
    pub updated_at_ms: i64,
}

impl Reflection {
    /// Combine the original answers with the engine output.
    #[must_use]
    pub fn from_parts(input: ReflectionInput, derived: DerivedGuidance, now_ms: i64) -> Self {
        Self {
            feeling: input.feeling,
            area: input.area,
            challenge: input.challenge,
            desired_outcome: input.desired_outcome,
            action_timeline: input.action_timeline,
            distilled: derived.distilled,
            guidance: derived.guidance,
            message: derived.message,
            emailed_to: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    /// The generated part of the record.
    #[must_use]
    pub fn derived(&self) -> DerivedGuidance {
        DerivedGuidance {
            distilled: self.distilled.clone(),
            guidance: self.guidance.clone(),
            message: self.message.clone(),
        }
    }

    /// Record an email target. Last write wins.
    pub fn mark_emailed(&mut self, email: &EmailAddress, now_ms: i64) {
        self.emailed_to = Some(email.as_str().to_string());
        self.updated_at_ms = now_ms;
    }
}

// =============================================================================
// EMAIL ADDRESS
// =============================================================================

/// A syntactically valid email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and wrap an address. Surrounding whitespace is trimmed.
    pub fn parse(raw: &str) -> Result<Self, DirectionError> {
        let candidate = raw.trim();
        let reject = |reason: &str| {
            DirectionError::Validation(format!("Invalid email address '{}': {}", candidate, reason))
        };

        if candidate.is_empty() {
            return Err(reject("address is empty"));
        }
        if candidate.len() > MAX_EMAIL_LENGTH {
            return Err(reject("address is too long"));
        }
        if candidate
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(reject("address contains whitespace"));
        }

        let mut parts = candidate.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(reject("address must contain exactly one '@'"));
        };

        if local.is_empty() || local.len() > MAX_EMAIL_LOCAL_LENGTH {
            return Err(reject("invalid local part"));
        }
        if domain.len() > MAX_EMAIL_DOMAIN_LENGTH || !domain.contains('.') {
            return Err(reject("domain must contain a '.'"));
        }
        if domain.split('.').any(str::is_empty) {
            return Err(reject("domain has an empty label"));
        }

        Ok(Self(candidate.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Direction Companion core.
///
/// - No silent failures
/// - Use `Result<T, DirectionError>` for fallible operations
/// - The core never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum DirectionError {
    /// A request field failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The identifier is not in the store's identifier format.
    #[error("Invalid reflection id: '{0}'")]
    InvalidIdentifier(String),

    /// The identifier is well-formed but no record carries it.
    #[error("Reflection not found: {0}")]
    NotFound(ReflectionId),

    /// The store was never opened or could not be reached.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The store rejected an operation.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A document renderer failed.
    #[error("Export error: {0}")]
    Export(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

// =============================================================================
// TESTS
// =============================================================================
