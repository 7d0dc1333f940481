//! Bounded snapshot queue and its single consumer
//!
//! Producers call [`BroadcastQueue::enqueue`], which never waits: a full
//! queue drops the snapshot. Because the sequence number was assigned
//! before the attempt, receivers see the loss as a gap.

use std::net::SocketAddr;
use std::sync::{Arc, Weak};

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::ledger::Ledger;
use crate::stats::ServerMetrics;

use super::sink::DatagramSink;
use super::snapshot::BroadcastSnapshot;

/// Producer half of the broadcast pipeline
#[derive(Debug, Clone)]
pub struct BroadcastQueue {
    tx: mpsc::Sender<BroadcastSnapshot>,
    capacity: usize,
    metrics: Arc<ServerMetrics>,
}

/// Consumer half of the broadcast pipeline
///
/// Exactly one exists per queue, so snapshots leave in the order they were
/// produced.
#[derive(Debug)]
pub struct BroadcastWorker {
    rx: mpsc::Receiver<BroadcastSnapshot>,
    metrics: Arc<ServerMetrics>,
    padding: usize,
}

impl BroadcastQueue {
    /// Create a queue holding up to `capacity` snapshots (at least 1)
    pub fn channel(capacity: usize, metrics: Arc<ServerMetrics>) -> (Self, BroadcastWorker) {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);

        let queue = Self {
            tx,
            capacity,
            metrics: Arc::clone(&metrics),
        };
        let worker = BroadcastWorker {
            rx,
            metrics,
            padding: 0,
        };

        (queue, worker)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Try to place a snapshot on the queue
    ///
    /// Returns false if it was dropped.
    pub fn enqueue(&self, snapshot: BroadcastSnapshot) -> bool {
        let seq = snapshot.seq_num;

        match self.tx.try_send(snapshot) {
            Ok(()) => {
                self.metrics.record_snapshot_enqueued();
                true
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.record_snapshot_dropped();
                tracing::warn!(
                    seq = seq,
                    capacity = self.capacity,
                    "Broadcast queue full, snapshot dropped"
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.metrics.record_snapshot_dropped();
                tracing::debug!(seq = seq, "Broadcast worker gone, snapshot dropped");
                false
            }
        }
    }
}

impl BroadcastWorker {
    /// Append `padding` filler bytes to every outgoing snapshot
    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    /// Spawn the worker loop
    ///
    /// Endpoints are read from `ledger` once per snapshot. The worker only
    /// keeps a weak reference, so it stops once the ledger is dropped.
    pub fn spawn<S: DatagramSink>(self, sink: Arc<S>, ledger: &Arc<Ledger>) -> JoinHandle<()> {
        tokio::spawn(self.run(sink, Arc::downgrade(ledger)))
    }

    /// Drain the queue until the ledger, which owns the producer, is gone
    pub async fn run<S: DatagramSink>(self, sink: Arc<S>, ledger: Weak<Ledger>) {
        let Self {
            mut rx,
            metrics,
            padding,
        } = self;

        while let Some(snapshot) = rx.recv().await {
            let endpoints = match ledger.upgrade() {
                Some(ledger) => ledger.endpoints().await,
                None => break,
            };
            deliver(sink.as_ref(), &metrics, padding, &snapshot, &endpoints).await;
        }

        tracing::debug!("Broadcast worker stopped");
    }
}

async fn deliver<S: DatagramSink>(
    sink: &S,
    metrics: &ServerMetrics,
    padding: usize,
    snapshot: &BroadcastSnapshot,
    endpoints: &[SocketAddr],
) {
    let data = match snapshot.to_message(padding).encode() {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(seq = snapshot.seq_num, error = %e, "Failed to encode snapshot");
            return;
        }
    };

    let mut failed = 0usize;
    for endpoint in endpoints {
        match sink.send_to(&data, *endpoint).await {
            Ok(_) => metrics.record_delivery(true),
            Err(e) => {
                failed += 1;
                metrics.record_delivery(false);
                tracing::warn!(
                    seq = snapshot.seq_num,
                    peer = %endpoint,
                    error = %e,
                    "Broadcast send failed"
                );
            }
        }
    }

    tracing::debug!(
        seq = snapshot.seq_num,
        endpoints = endpoints.len(),
        failed = failed,
        bytes = data.len(),
        "Snapshot broadcast"
    );
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::io;
    use std::net::SocketAddr;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::protocol::{Message, MessageType};

    /// Records every datagram; optionally refuses one endpoint
    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(SocketAddr, Message)>>,
        refuse: Option<SocketAddr>,
    }

    impl RecordingSink {
        fn refusing(addr: SocketAddr) -> Self {
            Self {
                refuse: Some(addr),
                ..Self::default()
            }
        }

        fn len(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        fn seqs_for(&self, addr: SocketAddr) -> Vec<u64> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|(to, _)| *to == addr)
                .filter_map(|(_, msg)| msg.seq_num)
                .collect()
        }
    }

    impl DatagramSink for RecordingSink {
        fn send_to(
            &self,
            buf: &[u8],
            target: SocketAddr,
        ) -> impl Future<Output = io::Result<usize>> + Send {
            let result = if self.refuse == Some(target) {
                Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
            } else {
                let msg = Message::decode(buf).unwrap();
                self.sent.lock().unwrap().push((target, msg));
                Ok(buf.len())
            };
            async move { result }
        }
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    async fn wait_for_sends(sink: &RecordingSink, n: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while sink.len() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for fan-out");
    }

    fn setup(capacity: usize) -> (Arc<Ledger>, BroadcastWorker, Arc<ServerMetrics>) {
        let metrics = Arc::new(ServerMetrics::new());
        let (queue, worker) = BroadcastQueue::channel(capacity, Arc::clone(&metrics));
        let ledger = Arc::new(Ledger::new(["A", "B", "C"], queue));
        (ledger, worker, metrics)
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (queue, _worker) = BroadcastQueue::channel(0, Arc::new(ServerMetrics::new()));
        assert_eq!(queue.capacity(), 1);
    }

    #[tokio::test]
    async fn test_full_queue_drops_and_leaves_gap() {
        let (ledger, worker, metrics) = setup(2);
        let sink = Arc::new(RecordingSink::default());

        ledger.register("alice", addr(5000)).await.unwrap();
        ledger.register("bob", addr(5001)).await.unwrap();

        // Worker not running yet: seq 1 and 2 fill the queue, seq 3 is dropped
        ledger.start_voting(Duration::from_secs(60)).await.unwrap();
        ledger.cast_vote("alice", "A").await.unwrap();
        ledger.cast_vote("bob", "B").await.unwrap();
        assert_eq!(ledger.broadcast_seq().await, 3);
        assert_eq!(metrics.snapshot().snapshots_dropped, 1);

        let _handle = worker.spawn(Arc::clone(&sink), &ledger);
        wait_for_sends(&sink, 4).await;

        ledger.end_voting().await;
        wait_for_sends(&sink, 6).await;

        assert_eq!(sink.seqs_for(addr(5000)), vec![1, 2, 4]);
        assert_eq!(sink.seqs_for(addr(5001)), vec![1, 2, 4]);

        let stats = metrics.snapshot();
        assert_eq!(stats.snapshots_enqueued, 3);
        assert_eq!(stats.snapshots_dropped, 1);
        assert_eq!(stats.datagrams_delivered, 6);
    }

    #[tokio::test]
    async fn test_failed_endpoint_does_not_stop_fanout() {
        let (ledger, worker, metrics) = setup(16);
        let sink = Arc::new(RecordingSink::refusing(addr(5001)));

        ledger.register("alice", addr(5000)).await.unwrap();
        ledger.register("bob", addr(5001)).await.unwrap();
        ledger.register("carol", addr(5002)).await.unwrap();

        let _handle = worker.spawn(Arc::clone(&sink), &ledger);

        ledger.start_voting(Duration::from_secs(60)).await.unwrap();
        wait_for_sends(&sink, 2).await;

        // Worker survives the failure and keeps going
        ledger.cast_vote("carol", "C").await.unwrap();
        wait_for_sends(&sink, 4).await;

        assert_eq!(sink.seqs_for(addr(5000)), vec![1, 2]);
        assert_eq!(sink.seqs_for(addr(5002)), vec![1, 2]);
        assert!(sink.seqs_for(addr(5001)).is_empty());
        assert_eq!(metrics.snapshot().send_failures, 2);
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let (ledger, worker, _metrics) = setup(256);
        let sink = Arc::new(RecordingSink::default());
        let _handle = worker.spawn(Arc::clone(&sink), &ledger);

        ledger.register("watcher", addr(4000)).await.unwrap();
        ledger.start_voting(Duration::from_secs(60)).await.unwrap();
        for i in 0..20u16 {
            let id = format!("voter-{}", i);
            ledger.register(&id, addr(6000 + i)).await.unwrap();
            ledger.cast_vote(&id, "A").await.unwrap();
        }

        wait_for_sends(&sink, 1).await;
        tokio::time::timeout(Duration::from_secs(2), async {
            while sink.seqs_for(addr(4000)).len() < 21 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for watcher");

        let seqs = sink.seqs_for(addr(4000));
        assert_eq!(seqs, (1..=21).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_worker_stops_with_ledger() {
        let (ledger, worker, _metrics) = setup(16);
        let sink = Arc::new(RecordingSink::default());
        let handle = worker.spawn(Arc::clone(&sink), &ledger);

        ledger.register("alice", addr(5000)).await.unwrap();
        ledger.start_voting(Duration::from_secs(60)).await.unwrap();
        wait_for_sends(&sink, 1).await;

        let weak = Arc::downgrade(&ledger);
        drop(ledger);

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("worker kept running after the ledger was dropped")
            .unwrap();
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_content() {
        let (ledger, worker, _metrics) = setup(16);
        let sink = Arc::new(RecordingSink::default());
        let _handle = worker.spawn(Arc::clone(&sink), &ledger);

        ledger.register("alice", addr(5000)).await.unwrap();
        ledger.start_voting(Duration::from_secs(60)).await.unwrap();
        ledger.cast_vote("alice", "A").await.unwrap();
        wait_for_sends(&sink, 2).await;

        let sent = sink.sent.lock().unwrap();
        let (_, last) = &sent[1];
        assert_eq!(last.kind, MessageType::Broadcast);
        assert_eq!(last.seq_num, Some(2));

        let counts = last.vote_counts.as_ref().unwrap();
        assert_eq!(counts.get("A"), Some(&1));
        assert_eq!(counts.get("B"), Some(&0));
        assert_eq!(counts.get("C"), Some(&0));
    }
}
