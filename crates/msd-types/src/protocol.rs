//! Protocol constants shared by every node.

use std::time::Duration;

/// Well-known UDP port every node binds and sends to.
pub const MSD_PORT_NUMBER: u16 = 53566;

/// Hop limit for outgoing multicast datagrams.
pub const DEFAULT_MULTICAST_HOPS: u32 = 128;

/// Period between DISCOVER broadcasts.
pub const DISCOVER_INTERVAL: Duration = Duration::from_secs(60);

/// Period between peer table sweeps.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(2 * 60);

/// Time a peer stays listed without being heard from.
pub const PEER_TTL: Duration = Duration::from_secs(2 * 60);
