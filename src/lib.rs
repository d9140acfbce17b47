//! Multicast service discovery node.
//!
//! Wires a [`NodeConfig`] into a multicast session running either the
//! discoverer or the instance role.

mod node;
mod version;

pub use node::{NodeError, discoverer_settings, run_discoverer, run_instance, session_config};
pub use version::VERSION;

// Re-export commonly used types from other crates
pub use msd_address::{MulticastAddress, derive_address};
pub use msd_config::{HostConfig, NodeConfig};
pub use msd_multicast::{Discoverer, DiscovererSettings, Instance, PeerEvent};
pub use msd_types::{GroupId, HostRecord};
