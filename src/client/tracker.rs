//! Receiver-side delivery accounting
//!
//! Nothing on the wire is retransmitted, so a client can only infer loss:
//! a vote without a confirming ACK is a ghost vote, and a jump in broadcast
//! sequence numbers is a run of lost snapshots.

use crate::protocol::constants::VOTE_ACK_PREFIX;
use crate::protocol::{Message, MessageType};

/// Counters kept by a voting client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryTracker {
    pub votes_sent: u64,
    pub votes_confirmed: u64,
    pub broadcasts_received: u64,
    /// Sum of all sequence gaps seen so far
    pub packets_lost: u64,
    /// Broadcasts that arrived after a higher sequence number
    pub out_of_order: u64,
    /// Highest sequence number seen
    pub last_seq: Option<u64>,
}

impl DeliveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_vote_sent(&mut self) {
        self.votes_sent += 1;
    }

    /// Account for one received message
    pub fn observe(&mut self, msg: &Message) {
        match msg.kind {
            MessageType::Ack => {
                let confirms_vote = msg
                    .message
                    .as_deref()
                    .is_some_and(|text| text.starts_with(VOTE_ACK_PREFIX));
                if confirms_vote {
                    self.votes_confirmed += 1;
                }
            }
            MessageType::Broadcast => {
                self.broadcasts_received += 1;
                if let Some(seq) = msg.seq_num {
                    self.observe_seq(seq);
                }
            }
            _ => {}
        }
    }

    fn observe_seq(&mut self, seq: u64) {
        match self.last_seq {
            Some(last) if seq > last => {
                self.packets_lost += seq - last - 1;
                self.last_seq = Some(seq);
            }
            Some(_) => self.out_of_order += 1,
            // Nothing before the first snapshot counts as lost
            None => self.last_seq = Some(seq),
        }
    }

    /// Votes sent but never confirmed
    pub fn ghost_votes(&self) -> u64 {
        self.votes_sent.saturating_sub(self.votes_confirmed)
    }

    /// Fraction of snapshots lost, in `[0, 1]`
    pub fn loss_rate(&self) -> f64 {
        let total = self.broadcasts_received + self.packets_lost;
        if total == 0 {
            0.0
        } else {
            self.packets_lost as f64 / total as f64
        }
    }
}
