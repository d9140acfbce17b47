//! Error types for multicast service discovery.

use thiserror::Error;

/// A multicast group identifier did not have the required length.
///
/// Raised when a session is constructed; the session never reaches the
/// listening state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidGroupIdError {
    /// Identifier had the wrong number of bytes
    #[error("invalid multicast group id: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Textual identifier was not valid hex
    #[error("invalid multicast group id: {0}")]
    InvalidHex(String),
}

/// A host record failed validation.
///
/// Carries every violation found, not just the first.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid host record: {}", .violations.join(", "))]
pub struct ValidationError {
    /// Human-readable description of each violated rule.
    pub violations: Vec<String>,
}

impl ValidationError {
    /// Create a validation error from a list of violations.
    pub fn new(violations: Vec<String>) -> Self {
        Self { violations }
    }
}

/// Errors that can occur during wire protocol operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Datagram was not valid MessagePack
    #[error("failed to decode packet: {0}")]
    Decode(String),

    /// Packet could not be serialized
    #[error("failed to encode packet: {0}")]
    Encode(String),

    /// Decoded value does not match the packet schema
    #[error("packet failed validation: {}", .0.join(", "))]
    Validation(Vec<String>),
}
