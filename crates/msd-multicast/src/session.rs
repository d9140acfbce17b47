//! Multicast transport session.
//!
//! The session owns the socket bound to the protocol port and joined to the
//! group address. All receives, role timers and shutdown are multiplexed on
//! one task, so role state is never touched concurrently.

use std::future::Future;
use std::io;
use std::net::{Ipv6Addr, SocketAddr, SocketAddrV6};
use std::time::Duration;

use async_trait::async_trait;
use network_interface::{NetworkInterface, NetworkInterfaceConfig};
use socket2::{Domain, Protocol, SockRef, Socket, Type};
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use msd_address::{MulticastAddress, derive_address};
use msd_types::WireError;
use msd_wire::{Packet, decode_packet};

use crate::config::SessionConfig;

/// Largest datagram accepted; longer ones are truncated and fail to decode.
const RECV_BUFFER_SIZE: usize = 4096;

/// Errors that can occur during multicast operations.
#[derive(Debug, thiserror::Error)]
pub enum MulticastError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error("Network interface not found: {0}")]
    InterfaceNotFound(String),
    #[error("Failed to list network interfaces: {0}")]
    Interface(String),
}

/// Outbound half of a session, as seen by roles.
#[async_trait]
pub trait PacketSender: Send + Sync {
    /// Encode and send a packet.
    ///
    /// `None` sends to the group; `Some(addr)` unicasts to that peer's
    /// address on the protocol port. Returns the number of bytes sent.
    async fn send_packet(
        &self,
        packet: &Packet,
        dest: Option<SocketAddr>,
    ) -> Result<usize, MulticastError>;
}

/// Timers a role can ask the session to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Periodic DISCOVER broadcast.
    Discover,
    /// Periodic peer table sweep.
    Cleanup,
}

/// A periodic timer owned by a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub kind: TimerKind,
    pub period: Duration,
    /// Fire once as soon as the session is listening, then every period.
    pub fire_immediately: bool,
}

impl Timer {
    pub fn new(kind: TimerKind, period: Duration) -> Self {
        Self {
            kind,
            period,
            fire_immediately: false,
        }
    }

    pub fn immediately(mut self) -> Self {
        self.fire_immediately = true;
        self
    }
}

/// Behavior plugged into a session.
#[async_trait]
pub trait Role: Send {
    /// Timers the session should drive for this role.
    fn timers(&self) -> Vec<Timer> {
        Vec::new()
    }

    /// Called once the group has been joined.
    async fn on_listening(&mut self, _tx: &dyn PacketSender) -> Result<(), MulticastError> {
        Ok(())
    }

    /// Called for every datagram that decoded and validated.
    async fn on_packet(&mut self, tx: &dyn PacketSender, packet: Packet, from: SocketAddr);

    /// Called when one of the role's timers fires.
    async fn on_timer(&mut self, _tx: &dyn PacketSender, _timer: TimerKind) {}

    /// Called after shutdown is requested, before the socket is released.
    async fn on_shutdown(&mut self, _tx: &dyn PacketSender) -> Result<(), MulticastError> {
        Ok(())
    }
}

/// Decode and validate a received datagram.
///
/// Malformed or invalid datagrams are logged with the sender's address and
/// yield `None`; the role never sees them.
pub fn receive_packet(data: &[u8], from: SocketAddr) -> Option<Packet> {
    match decode_packet(data) {
        Ok(packet) => {
            trace!(%from, kind = %packet.kind, "Received packet");
            Some(packet)
        }
        Err(WireError::Validation(violations)) => {
            debug!(%from, ?violations, "Discarding packet that failed validation");
            None
        }
        Err(e) => {
            debug!(%from, error = %e, len = data.len(), "Discarding undecodable datagram");
            None
        }
    }
}

/// A socket bound to the protocol port for one multicast group.
pub struct Session {
    socket: UdpSocket,
    address: MulticastAddress,
    interface: Option<String>,
    interface_index: u32,
    port: u16,
    multicast_hops: u32,
}

impl Session {
    /// Derive the group address and bind the socket.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(config: &SessionConfig) -> Result<Self, MulticastError> {
        let address = derive_address(&config.group);
        info!(address = %address, group = %config.group, "Canonical multicast address formed");

        let interface_index = match &config.interface {
            Some(name) => resolve_interface(name)?,
            None => 0,
        };

        let socket = create_socket(config.port)?;
        let socket = UdpSocket::from_std(socket.into())?;
        // Port 0 binds an ephemeral port; replies and group sends use it
        let port = socket.local_addr()?.port();

        Ok(Self {
            socket,
            address,
            interface: config.interface.clone(),
            interface_index,
            port,
            multicast_hops: config.multicast_hops,
        })
    }

    /// The group address this session joins.
    pub fn address(&self) -> &MulticastAddress {
        &self.address
    }

    /// Local address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, MulticastError> {
        Ok(self.socket.local_addr()?)
    }

    /// Destination for group sends, scoped to the selected interface.
    pub fn group_addr(&self) -> SocketAddr {
        SocketAddr::V6(SocketAddrV6::new(
            self.address.ip(),
            self.port,
            0,
            self.interface_index,
        ))
    }

    /// Configure multicast options and join the group.
    fn listen(&self) -> Result<(), MulticastError> {
        let sock = SockRef::from(&self.socket);

        // Broadcast has no meaning for IPv6 on most stacks
        if let Err(e) = sock.set_broadcast(true) {
            trace!(error = %e, "Failed to enable broadcast");
        }
        sock.set_multicast_hops_v6(self.multicast_hops)?;
        if self.interface_index != 0 {
            sock.set_multicast_if_v6(self.interface_index)?;
        }

        self.socket
            .join_multicast_v6(&self.address.ip(), self.interface_index)?;

        info!(
            address = %self.address,
            port = self.port,
            interface = self.interface.as_deref().unwrap_or("default"),
            "Joined multicast group"
        );
        Ok(())
    }

    /// Join the group and drive `role` until `shutdown` resolves.
    ///
    /// Socket errors after joining are logged and do not end the loop. When
    /// `shutdown` completes the role's shutdown hook runs before returning.
    pub async fn run<R, F>(self, role: &mut R, shutdown: F) -> Result<(), MulticastError>
    where
        R: Role + ?Sized,
        F: Future<Output = ()>,
    {
        self.listen()?;

        if let Err(e) = role.on_listening(&self).await {
            warn!(error = %e, "Failed to send on listening");
        }

        let start = Instant::now();
        let mut timers: Vec<(Timer, Instant)> = role
            .timers()
            .into_iter()
            .map(|timer| {
                let first = if timer.fire_immediately {
                    start
                } else {
                    start + timer.period
                };
                (timer, first)
            })
            .collect();

        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        tokio::pin!(shutdown);

        loop {
            let next = timers
                .iter()
                .enumerate()
                .min_by_key(|(_, (_, at))| *at)
                .map(|(index, (_, at))| (index, *at));

            let timer_due = async move {
                match next {
                    Some((index, at)) => {
                        tokio::time::sleep_until(at).await;
                        index
                    }
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;

                _ = &mut shutdown => break,
                recv = self.socket.recv_from(&mut buf) => match recv {
                    Ok((len, from)) => {
                        if let Some(packet) = receive_packet(&buf[..len], from) {
                            role.on_packet(&self, packet, from).await;
                        }
                    }
                    Err(e) => warn!(error = %e, "Socket receive error"),
                },
                index = timer_due => {
                    let (timer, at) = &mut timers[index];
                    *at += timer.period;
                    let kind = timer.kind;
                    role.on_timer(&self, kind).await;
                }
            }
        }

        debug!(address = %self.address, "Session shutting down");
        if let Err(e) = role.on_shutdown(&self).await {
            warn!(error = %e, "Failed to send on shutdown");
        }

        Ok(())
    }
}

#[async_trait]
impl PacketSender for Session {
    async fn send_packet(
        &self,
        packet: &Packet,
        dest: Option<SocketAddr>,
    ) -> Result<usize, MulticastError> {
        let bytes = packet.encode()?;
        let dest = match dest {
            Some(mut addr) => {
                addr.set_port(self.port);
                addr
            }
            None => self.group_addr(),
        };

        let sent = self.socket.send_to(&bytes, dest).await?;
        trace!(%dest, kind = %packet.kind, len = sent, "Sent packet");
        Ok(sent)
    }
}

/// Create the UDP socket bound to the protocol port on all addresses.
fn create_socket(port: u16) -> Result<Socket, MulticastError> {
    let socket = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP))?;

    socket.set_reuse_address(true)?;
    #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
    socket.set_reuse_port(true)?;

    let addr = SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, port, 0, 0);
    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;

    Ok(socket)
}

/// Resolve an interface name, or a numeric index, to an interface index.
fn resolve_interface(name: &str) -> Result<u32, MulticastError> {
    if let Ok(index) = name.parse::<u32>() {
        return Ok(index);
    }

    let interfaces = NetworkInterface::show().map_err(|e| MulticastError::Interface(e.to_string()))?;
    interfaces
        .into_iter()
        .find(|iface| iface.name == name)
        .map(|iface| iface.index)
        .ok_or_else(|| MulticastError::InterfaceNotFound(name.to_string()))
}
