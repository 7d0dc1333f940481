//! Shared voting state
//!
//! Registry, ballots, phase and the broadcast sequence counter form one
//! consistency domain. This type holds them without any locking; every
//! method is meant to run inside the ledger's critical section, with the
//! caller supplying the current time.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::time::Instant;

use crate::ballot::{BallotStore, Phase, PhaseController, Tally};
use crate::broadcast::{BroadcastSnapshot, SnapshotEvent};
use crate::registry::ClientRegistry;

use super::error::VoteError;

/// Current state as reported to a newly registered client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReport {
    /// Voting has not opened yet
    NotStarted,
    /// Voting is open
    Active {
        remaining: Duration,
        options: Vec<String>,
    },
    /// Voting is over
    Ended { tally: Tally },
}

impl StatusReport {
    pub fn phase(&self) -> Phase {
        match self {
            StatusReport::NotStarted => Phase::NotStarted,
            StatusReport::Active { .. } => Phase::Active,
            StatusReport::Ended { .. } => Phase::Ended,
        }
    }
}

impl std::fmt::Display for StatusReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusReport::NotStarted => write!(f, "waiting for voting to start"),
            StatusReport::Active { remaining, options } => {
                // Round to the nearest second
                let secs = (remaining.as_millis() + 500) / 1000;
                write!(
                    f,
                    "voting active: {}s remaining, options [{}]",
                    secs,
                    options.join(", ")
                )
            }
            StatusReport::Ended { tally } => write!(f, "voting ended: {}", tally),
        }
    }
}

/// Everything guarded by the ledger lock
#[derive(Debug)]
pub struct VotingState {
    clients: ClientRegistry,
    ballots: BallotStore,
    phase: PhaseController,
    /// Last sequence number handed out (0 = none yet)
    broadcast_seq: u64,
}

impl VotingState {
    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            clients: ClientRegistry::new(),
            ballots: BallotStore::new(options),
            phase: PhaseController::new(),
            broadcast_seq: 0,
        }
    }

    /// Register a client; allowed in every phase
    pub fn register(&mut self, client_id: &str, endpoint: SocketAddr) -> Result<(), VoteError> {
        self.clients.register(client_id, endpoint)
    }

    /// Validate and record a ballot
    ///
    /// Checks run in a fixed order and the first failure wins:
    /// registration, active window, prior ballot, option. Nothing is
    /// modified unless all four pass.
    pub fn cast_vote(&mut self, client_id: &str, option: &str, now: Instant) -> Result<(), VoteError> {
        if !self.clients.contains(client_id) {
            return Err(VoteError::NotRegistered);
        }

        if !self.phase.accepts_votes(now) {
            return Err(VoteError::VotingNotActive);
        }

        self.ballots.record(client_id, option)
    }

    /// Open voting for `duration` starting at `now`; returns the deadline
    pub fn start_voting(&mut self, duration: Duration, now: Instant) -> Result<Instant, VoteError> {
        self.phase.start(duration, now)
    }

    /// Close voting; true only for the call that made the transition
    pub fn end_voting(&mut self) -> bool {
        self.phase.end()
    }

    /// Advance the sequence counter and copy the tally into a snapshot
    pub fn next_snapshot(&mut self, event: SnapshotEvent) -> BroadcastSnapshot {
        self.broadcast_seq += 1;
        BroadcastSnapshot::new(self.broadcast_seq, self.ballots.tally().clone(), event)
    }

    pub fn status(&self, now: Instant) -> StatusReport {
        match self.phase.phase() {
            Phase::NotStarted => StatusReport::NotStarted,
            Phase::Active => StatusReport::Active {
                remaining: self.phase.remaining(now).unwrap_or(Duration::ZERO),
                options: self.ballots.options().to_vec(),
            },
            Phase::Ended => StatusReport::Ended {
                tally: self.ballots.tally().clone(),
            },
        }
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn ballots(&self) -> &BallotStore {
        &self.ballots
    }

    pub fn phase(&self) -> Phase {
        self.phase.phase()
    }

    pub fn broadcast_seq(&self) -> u64 {
        self.broadcast_seq
    }

    pub fn options(&self) -> &[String] {
        self.ballots.options()
    }
}
