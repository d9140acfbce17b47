//! Instance role: advertises this node and answers discovery queries.

use std::net::SocketAddr;

use async_trait::async_trait;
use tracing::{debug, info, trace, warn};

use msd_types::{HostRecord, ValidationError};
use msd_wire::{MessageType, Packet};

use crate::session::{MulticastError, PacketSender, Role};

/// Active role announcing one validated host record.
#[derive(Debug, Clone)]
pub struct Instance {
    host: HostRecord,
}

impl Instance {
    /// Validate the host record this instance will announce.
    ///
    /// Call before binding a session so a bad identity never reaches the
    /// network.
    pub fn new(host: HostRecord) -> Result<Self, ValidationError> {
        host.validate()?;
        Ok(Self { host })
    }

    pub fn host(&self) -> &HostRecord {
        &self.host
    }

    /// Send our ANNOUNCE to the group, or to one peer.
    pub async fn send_our_info(
        &self,
        tx: &dyn PacketSender,
        dest: Option<SocketAddr>,
    ) -> Result<usize, MulticastError> {
        tx.send_packet(&Packet::announce(self.host.clone()), dest)
            .await
    }

    /// Send our LOGOFF to the group.
    pub async fn send_logoff(&self, tx: &dyn PacketSender) -> Result<usize, MulticastError> {
        tx.send_packet(&Packet::logoff(self.host.clone()), None)
            .await
    }
}

#[async_trait]
impl Role for Instance {
    async fn on_listening(&mut self, tx: &dyn PacketSender) -> Result<(), MulticastError> {
        self.send_our_info(tx, None).await?;
        info!(id = %self.host.id, url = %self.host.url, "Announced to group");
        Ok(())
    }

    async fn on_packet(&mut self, tx: &dyn PacketSender, packet: Packet, from: SocketAddr) {
        match packet.kind {
            MessageType::Discover => {
                debug!(%from, "Answering DISCOVER");
                if let Err(e) = self.send_our_info(tx, Some(from)).await {
                    warn!(%from, error = %e, "Failed to answer DISCOVER");
                }
            }
            kind => trace!(%from, %kind, "Ignoring packet"),
        }
    }

    async fn on_shutdown(&mut self, tx: &dyn PacketSender) -> Result<(), MulticastError> {
        self.send_logoff(tx).await?;
        info!(id = %self.host.id, "Sent LOGOFF");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{RecordingSender, peer_addr};
    use crate::session::receive_packet;

    fn instance() -> Instance {
        Instance::new(HostRecord::new("abcd1234", "http://h:8080")).unwrap()
    }

    #[test]
    fn test_rejects_short_id() {
        let err = Instance::new(HostRecord::new("abcd123", "http://h:8080")).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert!(err.violations[0].contains("ID length"));
    }

    #[test]
    fn test_rejects_bad_url() {
        let err = Instance::new(HostRecord::new("abcd1234", "h:8080 nope")).unwrap_err();
        assert!(err.violations.iter().any(|v| v.starts_with("URL invalid")));
    }

    #[tokio::test]
    async fn test_announces_on_listening() {
        let mut instance = instance();
        let tx = RecordingSender::default();

        instance.on_listening(&tx).await.unwrap();

        let sent = tx.take();
        assert_eq!(sent.len(), 1);
        let (packet, dest) = &sent[0];
        assert_eq!(packet.kind, MessageType::Announce);
        assert_eq!(
            packet.host,
            Some(HostRecord::new("abcd1234", "http://h:8080"))
        );
        assert_eq!(*dest, None);
    }

    #[tokio::test]
    async fn test_listening_send_failure_is_surfaced() {
        let mut instance = instance();
        let tx = RecordingSender::failing();

        assert!(instance.on_listening(&tx).await.is_err());
    }

    #[tokio::test]
    async fn test_answers_discover_by_unicast() {
        let mut instance = instance();
        let tx = RecordingSender::default();

        instance.on_packet(&tx, Packet::discover(), peer_addr()).await;

        assert_eq!(
            tx.take(),
            vec![(Packet::announce(instance.host().clone()), Some(peer_addr()))]
        );
    }

    #[tokio::test]
    async fn test_ignores_other_instances() {
        let mut instance = instance();
        let tx = RecordingSender::default();
        let other = HostRecord::new("zzzz9999", "http://z:1");

        instance
            .on_packet(&tx, Packet::announce(other.clone()), peer_addr())
            .await;
        instance.on_packet(&tx, Packet::logoff(other), peer_addr()).await;

        assert!(tx.take().is_empty());
    }

    #[tokio::test]
    async fn test_logoff_on_shutdown() {
        let mut instance = instance();
        let tx = RecordingSender::default();

        instance.on_shutdown(&tx).await.unwrap();

        assert_eq!(
            tx.take(),
            vec![(Packet::logoff(instance.host().clone()), None)]
        );
    }

    #[tokio::test]
    async fn test_no_reply_to_garbage() {
        let mut instance = instance();
        let tx = RecordingSender::default();

        if let Some(packet) = receive_packet(&[0xc1], peer_addr()) {
            instance.on_packet(&tx, packet, peer_addr()).await;
        }

        assert!(tx.take().is_empty());
    }
}
