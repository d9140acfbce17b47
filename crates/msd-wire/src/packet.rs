//! Discovery packets and their MessagePack encoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use msd_types::{HostRecord, WireError};

use crate::schema::validate_packet;
use crate::types::MessageType;

/// A validated discovery packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Message type.
    pub kind: MessageType,
    /// Host record, absent for DISCOVER.
    pub host: Option<HostRecord>,
}

/// On-the-wire shape of a packet: `{ t, h }`.
#[derive(Debug, Serialize, Deserialize)]
struct WirePacket {
    t: u8,
    #[serde(default)]
    h: Option<HostRecord>,
}

impl Packet {
    /// Query for peers.
    pub fn discover() -> Self {
        Self {
            kind: MessageType::Discover,
            host: None,
        }
    }

    /// Advertise a host.
    pub fn announce(host: HostRecord) -> Self {
        Self {
            kind: MessageType::Announce,
            host: Some(host),
        }
    }

    /// Announce a host's departure.
    pub fn logoff(host: HostRecord) -> Self {
        Self {
            kind: MessageType::Logoff,
            host: Some(host),
        }
    }

    /// Serialize to a self-contained MessagePack datagram.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        encode_packet(self)
    }
}

/// Serialize a packet to a self-contained MessagePack datagram.
pub fn encode_packet(packet: &Packet) -> Result<Vec<u8>, WireError> {
    let wire = WirePacket {
        t: packet.kind.into(),
        h: packet.host.clone(),
    };
    rmp_serde::to_vec_named(&wire).map_err(|e| WireError::Encode(e.to_string()))
}

/// Decode a datagram into an untyped value tree without validating it.
pub fn decode_value(data: &[u8]) -> Result<Value, WireError> {
    if data.is_empty() {
        return Err(WireError::Decode("empty datagram".to_string()));
    }
    rmp_serde::from_slice(data).map_err(|e| WireError::Decode(e.to_string()))
}

/// Decode and validate a datagram.
///
/// Fails with [`WireError::Decode`] if the bytes are not MessagePack and with
/// [`WireError::Validation`] if the decoded value does not match the packet
/// schema or names an unknown message type.
pub fn decode_packet(data: &[u8]) -> Result<Packet, WireError> {
    let value = decode_value(data)?;
    validate_packet(&value)?;

    let wire: WirePacket =
        serde_json::from_value(value).map_err(|e| WireError::Validation(vec![e.to_string()]))?;
    let kind = MessageType::try_from(wire.t)
        .map_err(|code| WireError::Validation(vec![format!("unknown message type {code}")]))?;

    Ok(Packet {
        kind,
        host: wire.h,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> HostRecord {
        HostRecord::new("abcd1234", "http://h:8080")
    }

    #[test]
    fn test_packet_roundtrip() {
        for packet in [
            Packet::discover(),
            Packet::announce(host()),
            Packet::logoff(host()),
        ] {
            let bytes = packet.encode().unwrap();
            assert_eq!(decode_packet(&bytes).unwrap(), packet);
        }
    }

    #[test]
    fn test_wire_shape() {
        let value = decode_value(&Packet::discover().encode().unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({ "t": 1, "h": null }));

        let value = decode_value(&Packet::announce(host()).encode().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "t": 2, "h": { "url": "http://h:8080", "id": "abcd1234" } })
        );
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode_packet(&[]), Err(WireError::Decode(_))));
        // 0xc1 is never used in MessagePack
        assert!(matches!(decode_packet(&[0xc1]), Err(WireError::Decode(_))));
        // Map header announcing more entries than present
        assert!(matches!(decode_packet(&[0x82, 0xa1, b't']), Err(WireError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_schema_mismatch() {
        // A valid MessagePack integer, but not a packet
        assert!(matches!(decode_packet(&[0x05]), Err(WireError::Validation(_))));

        let bytes = rmp_serde::to_vec_named(&serde_json::json!({ "t": "2" })).unwrap();
        assert!(matches!(decode_packet(&bytes), Err(WireError::Validation(_))));
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let bytes = rmp_serde::to_vec_named(&serde_json::json!({ "t": 9, "h": null })).unwrap();
        let err = decode_packet(&bytes).unwrap_err();
        assert_eq!(
            err,
            WireError::Validation(vec!["unknown message type 9".to_string()])
        );
    }

    #[test]
    fn test_decode_keeps_missing_host() {
        // Schema allows an absent host; roles decide whether the type needs one
        let bytes = rmp_serde::to_vec_named(&serde_json::json!({ "t": 2 })).unwrap();
        let packet = decode_packet(&bytes).unwrap();
        assert_eq!(packet.kind, MessageType::Announce);
        assert!(packet.host.is_none());
    }
}
