//! Core types for multicast service discovery.
//!
//! This crate provides the fundamental types shared by every MSD component:
//! the multicast group identifier, the host record peers announce, and the
//! error types raised when either fails to validate.

mod error;
mod group;
mod host;
pub mod protocol;

pub use error::*;
pub use group::*;
pub use host::*;

/// Size constants for the discovery protocol.
pub mod sizes {
    /// Size of a multicast group identifier in bytes (112 bits, RFC 4291).
    pub const GROUP_ID_SIZE: usize = 14;
    /// Size of a full IPv6 address in bytes.
    pub const IPV6_ADDRESS_SIZE: usize = 16;
    /// Number of characters in a host identifier.
    pub const HOST_ID_LENGTH: usize = 8;
}
