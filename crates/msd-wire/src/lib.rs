//! Wire protocol encoding/decoding for multicast service discovery.
//!
//! Each UDP datagram carries one MessagePack map with two keys: `t`, the
//! message type, and `h`, the announcing host (nil for DISCOVER). Decoded
//! datagrams are checked against the packet schema before they are turned
//! into typed [`Packet`]s, since anyone on the link can send to the group.

mod packet;
mod schema;
mod types;

pub use packet::*;
pub use schema::*;
pub use types::*;
