//! Packet dispatcher
//!
//! Turns one inbound datagram into at most one unicast reply. Undecodable
//! payloads, unknown types and requests without a client id get no reply
//! at all.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::ledger::Ledger;
use crate::protocol::constants::VOTE_ACK_PREFIX;
use crate::protocol::{Message, MessageType};
use crate::stats::ServerMetrics;

/// Routes datagrams to the ledger
#[derive(Debug, Clone)]
pub struct Dispatcher {
    ledger: Arc<Ledger>,
    metrics: Arc<ServerMetrics>,
}

impl Dispatcher {
    pub fn new(ledger: Arc<Ledger>, metrics: Arc<ServerMetrics>) -> Self {
        Self { ledger, metrics }
    }

    /// Handle a datagram from `peer`
    ///
    /// Returns the ACK or ERROR to send back, or `None` if the datagram is
    /// discarded.
    pub async fn dispatch(&self, data: &[u8], peer: SocketAddr) -> Option<Message> {
        self.metrics.record_packet();

        let msg = match Message::decode(data) {
            Ok(msg) => msg,
            Err(e) => {
                self.metrics.record_malformed();
                tracing::warn!(peer = %peer, error = %e, "Discarding malformed packet");
                return None;
            }
        };

        let client_id = match msg.client_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => {
                self.metrics.record_malformed();
                tracing::warn!(peer = %peer, kind = ?msg.kind, "Discarding packet without client id");
                return None;
            }
        };

        match msg.kind {
            MessageType::Register => Some(self.handle_register(client_id, peer).await),
            MessageType::Vote => {
                let option = msg.vote.as_deref().unwrap_or_default();
                Some(self.handle_vote(client_id, option, peer).await)
            }
            other => {
                self.metrics.record_malformed();
                tracing::warn!(peer = %peer, kind = ?other, "Discarding unexpected message type");
                None
            }
        }
    }

    async fn handle_register(&self, client_id: &str, peer: SocketAddr) -> Message {
        match self.ledger.register(client_id, peer).await {
            Ok(status) => {
                self.metrics.record_registration(true);
                tracing::info!(
                    client_id = %client_id,
                    peer = %peer,
                    phase = %status.phase(),
                    "Client registered"
                );
                Message::ack(status.to_string())
            }
            Err(e) => {
                self.metrics.record_registration(false);
                tracing::debug!(client_id = %client_id, peer = %peer, "Registration rejected: {}", e);
                Message::error(e.to_string())
            }
        }
    }

    async fn handle_vote(&self, client_id: &str, option: &str, peer: SocketAddr) -> Message {
        let ordinal = self.metrics.record_vote_received();

        match self.ledger.cast_vote(client_id, option).await {
            Ok(()) => {
                self.metrics.record_vote_outcome(true);
                tracing::debug!(
                    vote = ordinal,
                    client_id = %client_id,
                    option = %option,
                    "Vote accepted"
                );
                Message::ack(format!("{}: {}", VOTE_ACK_PREFIX, option))
            }
            Err(e) => {
                self.metrics.record_vote_outcome(false);
                tracing::debug!(
                    vote = ordinal,
                    client_id = %client_id,
                    peer = %peer,
                    reason = %e,
                    "Vote rejected"
                );
                Message::error(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::broadcast::{BroadcastQueue, BroadcastWorker};

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn dispatcher() -> (Dispatcher, Arc<Ledger>, Arc<ServerMetrics>, BroadcastWorker) {
        let metrics = Arc::new(ServerMetrics::new());
        let (queue, worker) = BroadcastQueue::channel(64, Arc::clone(&metrics));
        let ledger = Arc::new(Ledger::new(["A", "B", "C"], queue));
        let dispatcher = Dispatcher::new(Arc::clone(&ledger), Arc::clone(&metrics));
        (dispatcher, ledger, metrics, worker)
    }

    fn encode(msg: &Message) -> Vec<u8> {
        msg.encode().unwrap()
    }

    #[tokio::test]
    async fn test_register_reply() {
        let (dispatcher, ledger, _metrics, _worker) = dispatcher();

        let reply = dispatcher
            .dispatch(&encode(&Message::register("alice")), addr(5000))
            .await
            .unwrap();
        assert_eq!(reply.kind, MessageType::Ack);
        assert_eq!(reply.message.as_deref(), Some("waiting for voting to start"));

        let reply = dispatcher
            .dispatch(&encode(&Message::register("alice")), addr(6000))
            .await
            .unwrap();
        assert_eq!(reply.kind, MessageType::Error);
        assert_eq!(reply.message.as_deref(), Some("client id already in use"));
        assert_eq!(ledger.lookup("alice").await, Some(addr(5000)));
    }

    #[tokio::test]
    async fn test_vote_replies() {
        let (dispatcher, ledger, metrics, _worker) = dispatcher();
        dispatcher
            .dispatch(&encode(&Message::register("alice")), addr(5000))
            .await;

        let vote = encode(&Message::vote("alice", "A"));

        let reply = dispatcher.dispatch(&vote, addr(5000)).await.unwrap();
        assert_eq!(reply.kind, MessageType::Error);
        assert_eq!(reply.message.as_deref(), Some("voting is not active"));

        ledger.start_voting(Duration::from_secs(60)).await.unwrap();

        let reply = dispatcher.dispatch(&vote, addr(5000)).await.unwrap();
        assert_eq!(reply.kind, MessageType::Ack);
        assert_eq!(reply.message.as_deref(), Some("vote recorded: A"));

        let reply = dispatcher.dispatch(&vote, addr(5000)).await.unwrap();
        assert_eq!(reply.message.as_deref(), Some("duplicate vote"));

        let reply = dispatcher
            .dispatch(&encode(&Message::vote("bob", "A")), addr(5001))
            .await
            .unwrap();
        assert_eq!(reply.message.as_deref(), Some("not registered"));

        let stats = metrics.snapshot();
        assert_eq!(stats.votes_received, 4);
        assert_eq!(stats.votes_accepted, 1);
        assert_eq!(stats.votes_rejected, 3);
        assert_eq!(ledger.tally().await.get("A"), Some(1));
    }

    #[tokio::test]
    async fn test_missing_vote_field_is_invalid_option() {
        let (dispatcher, ledger, _metrics, _worker) = dispatcher();
        dispatcher
            .dispatch(&encode(&Message::register("alice")), addr(5000))
            .await;
        ledger.start_voting(Duration::from_secs(60)).await.unwrap();

        let reply = dispatcher
            .dispatch(br#"{"type":"VOTE","client_id":"alice"}"#, addr(5000))
            .await
            .unwrap();

        assert_eq!(reply.kind, MessageType::Error);
        assert_eq!(reply.message.as_deref(), Some("invalid option: "));
    }

    #[tokio::test]
    async fn test_garbage_is_silently_dropped() {
        let (dispatcher, ledger, metrics, _worker) = dispatcher();

        let inputs: [&[u8]; 5] = [
            b"\x00\xff\x13",
            b"VOTE A",
            br#"{"type":"PING","client_id":"alice"}"#,
            br#"{"type":"BROADCAST","client_id":"alice","seq_num":3}"#,
            br#"{"type":"REGISTER"}"#,
        ];
        for input in inputs {
            assert!(dispatcher.dispatch(input, addr(5000)).await.is_none());
        }

        let stats = metrics.snapshot();
        assert_eq!(stats.packets_received, 5);
        assert_eq!(stats.malformed_packets, 5);
        assert_eq!(ledger.client_count().await, 0);
    }

    #[tokio::test]
    async fn test_register_while_active_reports_remaining() {
        let (dispatcher, ledger, _metrics, _worker) = dispatcher();
        ledger.start_voting(Duration::from_secs(60)).await.unwrap();

        let reply = dispatcher
            .dispatch(&encode(&Message::register("late")), addr(5000))
            .await
            .unwrap();

        let text = reply.message.unwrap();
        assert!(text.starts_with("voting active: "), "{}", text);
        assert!(text.ends_with("options [A, B, C]"), "{}", text);
    }
}
