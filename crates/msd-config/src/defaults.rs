//! Protocol default values.

use std::time::Duration;

use msd_types::protocol::{
    CLEANUP_INTERVAL, DEFAULT_MULTICAST_HOPS, DISCOVER_INTERVAL, MSD_PORT_NUMBER, PEER_TTL,
};

/// Environment variable naming the interface that joins the group.
pub const MULTICAST_INTERFACE_ENV: &str = "MSD_MULTICAST_INTERFACE";

/// Group id of the reference deployment.
pub const DEFAULT_GROUP_ID: &str = "55c545258c440a731a50810425bc";

/// Protocol defaults.
#[derive(Debug, Clone)]
pub struct Defaults {
    /// Default UDP port.
    pub default_port: u16,
    /// Default multicast hop limit.
    pub default_multicast_hops: u32,
    /// Default period between DISCOVER broadcasts.
    pub default_discover_interval: Duration,
    /// Default period between peer table sweeps.
    pub default_cleanup_interval: Duration,
    /// Default time a peer stays listed without being heard from.
    pub default_peer_ttl: Duration,
    /// Default group id (hex).
    pub default_group_id: String,
}

/// Get the protocol defaults.
pub fn get_defaults() -> Defaults {
    Defaults {
        default_port: MSD_PORT_NUMBER,
        default_multicast_hops: DEFAULT_MULTICAST_HOPS,
        default_discover_interval: DISCOVER_INTERVAL,
        default_cleanup_interval: CLEANUP_INTERVAL,
        default_peer_ttl: PEER_TTL,
        default_group_id: DEFAULT_GROUP_ID.to_string(),
    }
}
