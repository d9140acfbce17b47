//! Discoverer role: polls the group and tracks live peers.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use msd_types::HostRecord;
use msd_types::protocol::{CLEANUP_INTERVAL, DISCOVER_INTERVAL, PEER_TTL};
use msd_wire::{MessageType, Packet};

use crate::peers::PeerTable;
use crate::session::{MulticastError, PacketSender, Role, Timer, TimerKind};

/// Timing for a discoverer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscovererSettings {
    /// Period between DISCOVER broadcasts.
    pub discover_interval: Duration,
    /// Period between peer table sweeps.
    pub cleanup_interval: Duration,
    /// Time a peer stays listed without being heard from.
    pub peer_ttl: Duration,
}

impl Default for DiscovererSettings {
    fn default() -> Self {
        Self {
            discover_interval: DISCOVER_INTERVAL,
            cleanup_interval: CLEANUP_INTERVAL,
            peer_ttl: PEER_TTL,
        }
    }
}

/// Change in the set of known peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// First ANNOUNCE from a peer id.
    Joined(HostRecord),
    /// Repeat ANNOUNCE from a known peer id.
    Refreshed(HostRecord),
    /// Peer sent LOGOFF.
    LoggedOff(HostRecord),
    /// Peer was silent for longer than the TTL.
    Expired(HostRecord),
}

/// Passive role that polls for peers and keeps a liveness table.
pub struct Discoverer {
    settings: DiscovererSettings,
    peers: PeerTable,
    events: mpsc::UnboundedSender<PeerEvent>,
}

impl Discoverer {
    /// Create a discoverer and the channel its peer events are sent on.
    pub fn new(settings: DiscovererSettings) -> (Self, mpsc::UnboundedReceiver<PeerEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();

        (
            Self {
                settings,
                peers: PeerTable::new(settings.peer_ttl),
                events,
            },
            events_rx,
        )
    }

    pub fn settings(&self) -> &DiscovererSettings {
        &self.settings
    }

    /// Number of peers currently listed.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Broadcast a DISCOVER to the group.
    pub async fn broadcast_discover(&self, tx: &dyn PacketSender) -> Result<usize, MulticastError> {
        tx.send_packet(&Packet::discover(), None).await
    }

    fn handle_packet(&mut self, packet: Packet, from: SocketAddr, now: Instant) {
        match (packet.kind, packet.host) {
            (MessageType::Discover, _) => {
                trace!(%from, "Ignoring DISCOVER");
            }
            (kind, None) => {
                debug!(%from, %kind, "Discarding packet without host");
            }
            (MessageType::Announce, Some(host)) => {
                let event = match self.peers.upsert(host.clone(), now) {
                    None => {
                        info!(peer = %host.id, url = %host.url, %from, "Peer joined");
                        PeerEvent::Joined(host)
                    }
                    Some(_) => {
                        debug!(peer = %host.id, %from, "Peer refreshed");
                        PeerEvent::Refreshed(host)
                    }
                };
                self.emit(event);
                self.log_peers();
            }
            (MessageType::Logoff, Some(host)) => {
                match self.peers.remove(&host.id) {
                    Some(entry) => {
                        info!(peer = %host.id, %from, "Peer logged off");
                        self.emit(PeerEvent::LoggedOff(entry.host));
                    }
                    None => debug!(peer = %host.id, %from, "LOGOFF for unknown peer"),
                }
                self.log_peers();
            }
        }
    }

    fn cleanup(&mut self, now: Instant) {
        for entry in self.peers.evict_stale(now) {
            info!(peer = %entry.host.id, "Peer expired");
            self.emit(PeerEvent::Expired(entry.host));
        }
        self.log_peers();
    }

    fn emit(&self, event: PeerEvent) {
        if let Err(e) = self.events.send(event) {
            trace!("No listener for peer event: {:?}", e.0);
        }
    }

    fn log_peers(&self) {
        debug!(count = self.peers.len(), peers = ?self.peers.ids(), "Peers now");
    }
}

#[async_trait]
impl Role for Discoverer {
    fn timers(&self) -> Vec<Timer> {
        vec![
            Timer::new(TimerKind::Discover, self.settings.discover_interval).immediately(),
            Timer::new(TimerKind::Cleanup, self.settings.cleanup_interval),
        ]
    }

    async fn on_packet(&mut self, _tx: &dyn PacketSender, packet: Packet, from: SocketAddr) {
        self.handle_packet(packet, from, Instant::now());
    }

    async fn on_timer(&mut self, tx: &dyn PacketSender, timer: TimerKind) {
        match timer {
            TimerKind::Discover => {
                if let Err(e) = self.broadcast_discover(tx).await {
                    warn!(error = %e, "Failed to broadcast DISCOVER");
                }
            }
            TimerKind::Cleanup => self.cleanup(Instant::now()),
        }
    }
}
