//! Peer liveness table kept by the discoverer.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use msd_types::HostRecord;

/// A peer heard from on the group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEntry {
    /// Last announced host record.
    pub host: HostRecord,
    /// When the last ANNOUNCE from this peer arrived.
    pub last_seen: Instant,
}

/// Peers keyed by host id, evicted once silent for longer than the TTL.
#[derive(Debug)]
pub struct PeerTable {
    peers: HashMap<String, PeerEntry>,
    ttl: Duration,
}

impl PeerTable {
    /// Create an empty table.
    pub fn new(ttl: Duration) -> Self {
        Self {
            peers: HashMap::new(),
            ttl,
        }
    }

    /// Insert or replace the entry for `host.id`. Returns the previous entry.
    ///
    /// Last write wins: the stored record and timestamp are fully replaced.
    pub fn upsert(&mut self, host: HostRecord, now: Instant) -> Option<PeerEntry> {
        self.peers.insert(
            host.id.clone(),
            PeerEntry {
                host,
                last_seen: now,
            },
        )
    }

    /// Remove a peer. Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: &str) -> Option<PeerEntry> {
        self.peers.remove(id)
    }

    /// Remove every peer silent for longer than the TTL as of `now`.
    ///
    /// A peer seen exactly one TTL ago is kept.
    pub fn evict_stale(&mut self, now: Instant) -> Vec<PeerEntry> {
        let stale: Vec<String> = self
            .peers
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.last_seen) > self.ttl)
            .map(|(id, _)| id.clone())
            .collect();

        stale
            .into_iter()
            .filter_map(|id| self.peers.remove(&id))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&PeerEntry> {
        self.peers.get(id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Known peer ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.peers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(120);

    fn host(id: &str, url: &str) -> HostRecord {
        HostRecord::new(id, url)
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut table = PeerTable::new(TTL);
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(5);

        assert!(table.upsert(host("abcd1234", "http://a"), t0).is_none());
        let previous = table.upsert(host("abcd1234", "http://a"), t1).unwrap();

        assert_eq!(previous.last_seen, t0);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("abcd1234").unwrap().last_seen, t1);
    }

    #[test]
    fn test_upsert_replaces_record() {
        let mut table = PeerTable::new(TTL);
        let t0 = Instant::now();

        table.upsert(host("abcd1234", "http://old"), t0);
        table.upsert(host("abcd1234", "http://new"), t0);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("abcd1234").unwrap().host.url, "http://new");
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut table = PeerTable::new(TTL);
        table.upsert(host("abcd1234", "http://a"), Instant::now());

        assert!(table.remove("zzzz9999").is_none());
        assert_eq!(table.len(), 1);
        assert!(table.remove("abcd1234").is_some());
        assert!(table.is_empty());
    }

    #[test]
    fn test_eviction_boundary_is_exclusive() {
        let mut table = PeerTable::new(TTL);
        let t0 = Instant::now();
        table.upsert(host("oldpeer1", "http://a"), t0);
        table.upsert(host("newpeer1", "http://b"), t0 + Duration::from_secs(30));

        // Exactly one TTL after the first peer was seen: both stay
        assert!(table.evict_stale(t0 + TTL).is_empty());
        assert_eq!(table.len(), 2);

        // Just past the boundary: only the older peer goes
        let evicted = table.evict_stale(t0 + TTL + Duration::from_millis(1));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].host.id, "oldpeer1");
        assert_eq!(table.ids(), vec!["newpeer1"]);
    }

    #[test]
    fn test_eviction_ignores_clock_behind_last_seen() {
        let mut table = PeerTable::new(TTL);
        let t0 = Instant::now();
        table.upsert(host("abcd1234", "http://a"), t0 + Duration::from_secs(10));

        assert!(table.evict_stale(t0).is_empty());
        assert_eq!(table.len(), 1);
    }
}
