//! Multicast group identifiers.

use std::fmt;

use crate::error::InvalidGroupIdError;
use crate::sizes::GROUP_ID_SIZE;

/// A 14-byte identifier selecting a multicast discovery channel.
///
/// Peers sharing a group id derive the same multicast address and so find
/// each other without a directory.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId([u8; GROUP_ID_SIZE]);

impl GroupId {
    /// Create a group id from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidGroupIdError> {
        if bytes.len() != GROUP_ID_SIZE {
            return Err(InvalidGroupIdError::InvalidLength {
                expected: GROUP_ID_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; GROUP_ID_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Parse a group id from its hex form (28 hex digits).
    pub fn from_hex(text: &str) -> Result<Self, InvalidGroupIdError> {
        let bytes =
            hex::decode(text.trim()).map_err(|e| InvalidGroupIdError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Get the raw bytes of the group id.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; GROUP_ID_SIZE] {
        &self.0
    }

    /// Hex representation, as used in configuration files.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for GroupId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; GROUP_ID_SIZE]> for GroupId {
    fn from(bytes: [u8; GROUP_ID_SIZE]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for GroupId {
    type Error = InvalidGroupIdError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl std::str::FromStr for GroupId {
    type Err = InvalidGroupIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({})", hex::encode(self.0))
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
