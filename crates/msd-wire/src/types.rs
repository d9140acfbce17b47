//! Message type identifiers.

use std::fmt;

/// Discovery message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Query for peers, carries no host
    Discover = 1,
    /// Self-advertisement, carries the sender's host
    Announce = 2,
    /// Graceful departure, carries the sender's host
    Logoff = 3,
}

impl TryFrom<u8> for MessageType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Discover),
            2 => Ok(Self::Announce),
            3 => Ok(Self::Logoff),
            other => Err(other),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(value: MessageType) -> Self {
        value as u8
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discover => write!(f, "DISCOVER"),
            Self::Announce => write!(f, "ANNOUNCE"),
            Self::Logoff => write!(f, "LOGOFF"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_codes() {
        assert_eq!(u8::from(MessageType::Discover), 1);
        assert_eq!(u8::from(MessageType::Announce), 2);
        assert_eq!(u8::from(MessageType::Logoff), 3);
        assert_eq!(MessageType::try_from(2), Ok(MessageType::Announce));
        assert_eq!(MessageType::try_from(0), Err(0));
        assert_eq!(MessageType::try_from(4), Err(4));
    }
}
