//! Counters for the voting server

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by the dispatcher, ledger and broadcast worker
///
/// All updates are relaxed; readers get a consistent-enough view through
/// [`ServerMetrics::snapshot`].
#[derive(Debug, Default)]
pub struct ServerMetrics {
    packets_received: AtomicU64,
    malformed_packets: AtomicU64,
    registrations_accepted: AtomicU64,
    registrations_rejected: AtomicU64,
    votes_received: AtomicU64,
    votes_accepted: AtomicU64,
    votes_rejected: AtomicU64,
    snapshots_enqueued: AtomicU64,
    snapshots_dropped: AtomicU64,
    datagrams_delivered: AtomicU64,
    send_failures: AtomicU64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_packet(&self) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.malformed_packets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_registration(&self, accepted: bool) {
        if accepted {
            self.registrations_accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.registrations_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count a vote attempt; returns its 1-based ordinal
    pub fn record_vote_received(&self) -> u64 {
        self.votes_received.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_vote_outcome(&self, accepted: bool) {
        if accepted {
            self.votes_accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.votes_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_snapshot_enqueued(&self) {
        self.snapshots_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot_dropped(&self) {
        self.snapshots_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery(&self, ok: bool) {
        if ok {
            self.datagrams_delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.send_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Copy the counters out
    pub fn snapshot(&self) -> ServerStats {
        ServerStats {
            packets_received: self.packets_received.load(Ordering::Relaxed),
            malformed_packets: self.malformed_packets.load(Ordering::Relaxed),
            registrations_accepted: self.registrations_accepted.load(Ordering::Relaxed),
            registrations_rejected: self.registrations_rejected.load(Ordering::Relaxed),
            votes_received: self.votes_received.load(Ordering::Relaxed),
            votes_accepted: self.votes_accepted.load(Ordering::Relaxed),
            votes_rejected: self.votes_rejected.load(Ordering::Relaxed),
            snapshots_enqueued: self.snapshots_enqueued.load(Ordering::Relaxed),
            snapshots_dropped: self.snapshots_dropped.load(Ordering::Relaxed),
            datagrams_delivered: self.datagrams_delivered.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

/// Server-wide statistics at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerStats {
    /// Datagrams read off the socket
    pub packets_received: u64,
    /// Datagrams discarded as undecodable or of unknown type
    pub malformed_packets: u64,
    pub registrations_accepted: u64,
    pub registrations_rejected: u64,
    /// Every VOTE seen, accepted or not
    pub votes_received: u64,
    pub votes_accepted: u64,
    pub votes_rejected: u64,
    /// Snapshots placed on the broadcast queue
    pub snapshots_enqueued: u64,
    /// Snapshots discarded because the queue was full
    pub snapshots_dropped: u64,
    /// Fan-out datagrams handed to the socket
    pub datagrams_delivered: u64,
    /// Fan-out sends that returned an error
    pub send_failures: u64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots produced, whether or not they were queued
    pub fn snapshots_produced(&self) -> u64 {
        self.snapshots_enqueued + self.snapshots_dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_stats_new() {
        let stats = ServerStats::new();
        assert_eq!(stats.packets_received, 0);
        assert_eq!(stats.votes_received, 0);
        assert_eq!(stats.snapshots_produced(), 0);
    }

    #[test]
    fn test_counters() {
        let metrics = ServerMetrics::new();

        metrics.record_packet();
        metrics.record_packet();
        metrics.record_malformed();
        metrics.record_registration(true);
        metrics.record_registration(false);
        assert_eq!(metrics.record_vote_received(), 1);
        assert_eq!(metrics.record_vote_received(), 2);
        metrics.record_vote_outcome(true);
        metrics.record_vote_outcome(false);
        metrics.record_snapshot_enqueued();
        metrics.record_snapshot_dropped();
        metrics.record_delivery(true);
        metrics.record_delivery(false);

        let stats = metrics.snapshot();
        assert_eq!(stats.packets_received, 2);
        assert_eq!(stats.malformed_packets, 1);
        assert_eq!(stats.registrations_accepted, 1);
        assert_eq!(stats.registrations_rejected, 1);
        assert_eq!(stats.votes_received, 2);
        assert_eq!(stats.votes_accepted, 1);
        assert_eq!(stats.votes_rejected, 1);
        assert_eq!(stats.snapshots_produced(), 2);
        assert_eq!(stats.datagrams_delivered, 1);
        assert_eq!(stats.send_failures, 1);
    }
}
