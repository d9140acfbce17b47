//! Multicast service discovery over IPv6 link-local groups.
//!
//! A [`Session`] owns the UDP socket joined to the group derived from a
//! [`GroupId`](msd_types::GroupId) and runs a single event loop that feeds
//! validated packets and timer ticks to one [`Role`]:
//!
//! - [`Discoverer`] polls the group and keeps a table of live peers.
//! - [`Instance`] announces its own host record and answers DISCOVER queries.

mod config;
mod discoverer;
mod instance;
mod peers;
mod session;

pub use config::SessionConfig;
pub use discoverer::{Discoverer, DiscovererSettings, PeerEvent};
pub use instance::Instance;
pub use peers::{PeerEntry, PeerTable};
pub use session::{
    MulticastError, PacketSender, Role, Session, Timer, TimerKind, receive_packet,
};
