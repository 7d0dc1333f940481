//! Broadcast snapshot types

use std::time::Duration;

use crate::ballot::Tally;
use crate::protocol::Message;

/// What produced a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotEvent {
    /// Voting window opened
    VotingStarted {
        duration: Duration,
        options: Vec<String>,
    },
    /// A ballot was accepted
    VoteAccepted,
    /// Voting window closed; the tally is final
    VotingEnded,
}

impl SnapshotEvent {
    fn describe(&self) -> Option<String> {
        match self {
            SnapshotEvent::VotingStarted { duration, options } => Some(format!(
                "voting started: {}s, options [{}]",
                duration.as_secs(),
                options.join(", ")
            )),
            SnapshotEvent::VoteAccepted => None,
            SnapshotEvent::VotingEnded => Some("voting ended".to_string()),
        }
    }
}

/// Immutable copy of the tally tagged with a sequence number
///
/// Never references the live tally. Sequence numbers start at 1 and
/// advance once per event, whether or not the snapshot is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastSnapshot {
    pub seq_num: u64,
    pub tally: Tally,
    pub event: SnapshotEvent,
}

impl BroadcastSnapshot {
    pub fn new(seq_num: u64, tally: Tally, event: SnapshotEvent) -> Self {
        Self {
            seq_num,
            tally,
            event,
        }
    }

    /// Build the BROADCAST envelope
    ///
    /// `padding` filler bytes are appended to the text to inflate the
    /// datagram.
    pub fn to_message(&self, padding: usize) -> Message {
        let text = match (self.event.describe(), padding) {
            (text, 0) => text,
            (Some(text), n) => Some(text + &".".repeat(n)),
            (None, n) => Some(".".repeat(n)),
        };

        Message::broadcast(self.seq_num, self.tally.counts().clone(), text)
    }
}
