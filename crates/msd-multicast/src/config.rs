//! Session configuration.

use msd_types::GroupId;
use msd_types::protocol::{DEFAULT_MULTICAST_HOPS, MSD_PORT_NUMBER};

/// Configuration for a multicast session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Group whose derived address the session joins.
    pub group: GroupId,
    /// Interface name (or numeric index) used to join the group.
    pub interface: Option<String>,
    /// UDP port bound locally and used as destination.
    pub port: u16,
    /// Hop limit for outgoing multicast datagrams.
    pub multicast_hops: u32,
}

impl SessionConfig {
    /// Create a configuration for a group with protocol defaults.
    pub fn new(group: GroupId) -> Self {
        Self {
            group,
            interface: None,
            port: MSD_PORT_NUMBER,
            multicast_hops: DEFAULT_MULTICAST_HOPS,
        }
    }

    /// Set the interface.
    pub fn with_interface(mut self, interface: Option<String>) -> Self {
        self.interface = interface;
        self
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the multicast hop limit.
    pub fn with_multicast_hops(mut self, hops: u32) -> Self {
        self.multicast_hops = hops;
        self
    }
}
