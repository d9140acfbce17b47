//! IPv6 multicast address derivation for discovery groups.
//!
//! Every discovery channel is identified by a 14-byte [`GroupId`]. The group
//! is mapped onto an old-style link-local multicast address (RFC 2373) by
//! prefixing it with `ff02`:
//!
//! - Bytes 0-1: Prefix (`0xff`, `0x02`)
//! - Bytes 2-15: The group id, unchanged
//!
//! The mapping is a pure function of the group id, so all peers configured
//! with the same group rendezvous on the same address.

use std::fmt;
use std::net::Ipv6Addr;

use msd_types::GroupId;
use msd_types::sizes::{GROUP_ID_SIZE, IPV6_ADDRESS_SIZE};

/// The link-local multicast prefix placed before the group id.
pub const MULTICAST_PREFIX: [u8; 2] = [0xff, 0x02];

/// A link-local IPv6 multicast address derived from a group id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MulticastAddress([u8; IPV6_ADDRESS_SIZE]);

impl MulticastAddress {
    /// Get the raw bytes of the address.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; IPV6_ADDRESS_SIZE] {
        &self.0
    }

    /// The address as a standard library IPv6 address.
    pub fn ip(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.0)
    }

    /// Returns true if the address carries the link-local multicast prefix.
    pub fn is_valid(&self) -> bool {
        self.0[..MULTICAST_PREFIX.len()] == MULTICAST_PREFIX
    }

    /// Recover the group id embedded in this address.
    pub fn group_id(&self) -> GroupId {
        let mut group = [0u8; GROUP_ID_SIZE];
        group.copy_from_slice(&self.0[MULTICAST_PREFIX.len()..]);
        GroupId::from(group)
    }

    /// Canonical compressed textual form (RFC 5952).
    pub fn canonical(&self) -> String {
        self.ip().to_string()
    }

    /// Fully expanded form: eight zero-padded groups, no compression.
    pub fn to_expanded_string(&self) -> String {
        let mut parts = Vec::with_capacity(8);
        for i in 0..8 {
            let word = u16::from_be_bytes([self.0[i * 2], self.0[i * 2 + 1]]);
            parts.push(format!("{:04x}", word));
        }
        parts.join(":")
    }
}

impl fmt::Display for MulticastAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ip())
    }
}

impl From<MulticastAddress> for Ipv6Addr {
    fn from(addr: MulticastAddress) -> Self {
        addr.ip()
    }
}

/// Derive the multicast address for a group id.
///
/// The group id type already guarantees the 14-byte length, so derivation
/// cannot fail; raw bytes are checked by [`derive_address_from_bytes`].
pub fn derive_address(group: &GroupId) -> MulticastAddress {
    let mut addr = [0u8; IPV6_ADDRESS_SIZE];
    addr[..MULTICAST_PREFIX.len()].copy_from_slice(&MULTICAST_PREFIX);
    addr[MULTICAST_PREFIX.len()..].copy_from_slice(group.as_bytes());
    MulticastAddress(addr)
}

/// Derive the multicast address for a group id given as raw bytes.
pub fn derive_address_from_bytes(
    bytes: &[u8],
) -> Result<MulticastAddress, msd_types::InvalidGroupIdError> {
    let group = GroupId::from_bytes(bytes)?;
    Ok(derive_address(&group))
}
