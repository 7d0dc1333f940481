//! Ledger implementation
//!
//! Wraps [`VotingState`] in one async mutex and connects it to the broadcast
//! queue. Every state-changing operation takes the lock once, performs all
//! of its checks and writes, hands any snapshot to the queue (a non-blocking
//! attempt), and releases the lock. Nothing awaits while the lock is held.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::ballot::{Phase, Tally, MAX_VOTING_WINDOW};
use crate::broadcast::{BroadcastQueue, SnapshotEvent};

use super::error::VoteError;
use super::state::{StatusReport, VotingState};

/// Registry, ballots and phase behind a single lock
#[derive(Debug)]
pub struct Ledger {
    state: Mutex<VotingState>,
    queue: BroadcastQueue,
}

impl Ledger {
    /// Create a ledger for `options` publishing into `queue`
    pub fn new<I, S>(options: I, queue: BroadcastQueue) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            state: Mutex::new(VotingState::new(options)),
            queue,
        }
    }

    /// Register a client and report the current phase to it
    pub async fn register(
        &self,
        client_id: &str,
        endpoint: SocketAddr,
    ) -> Result<StatusReport, VoteError> {
        let mut state = self.state.lock().await;
        state.register(client_id, endpoint)?;
        Ok(state.status(Instant::now()))
    }

    /// Cast a vote at the current time
    pub async fn cast_vote(&self, client_id: &str, option: &str) -> Result<(), VoteError> {
        self.cast_vote_at(client_id, option, Instant::now()).await
    }

    /// Cast a vote as if it arrived at `now`
    pub async fn cast_vote_at(
        &self,
        client_id: &str,
        option: &str,
        now: Instant,
    ) -> Result<(), VoteError> {
        let mut state = self.state.lock().await;
        state.cast_vote(client_id, option, now)?;

        let snapshot = state.next_snapshot(SnapshotEvent::VoteAccepted);
        self.queue.enqueue(snapshot);
        Ok(())
    }

    /// Open voting for `duration`
    ///
    /// Emits the start snapshot and schedules [`Ledger::end_voting`] at the
    /// deadline. Must be called from within a tokio runtime. `duration` is
    /// clamped to [`MAX_VOTING_WINDOW`].
    pub async fn start_voting(self: &Arc<Self>, duration: Duration) -> Result<Instant, VoteError> {
        let duration = duration.min(MAX_VOTING_WINDOW);
        let deadline = {
            let mut state = self.state.lock().await;
            let deadline = state.start_voting(duration, Instant::now())?;

            let event = SnapshotEvent::VotingStarted {
                duration,
                options: state.options().to_vec(),
            };
            let snapshot = state.next_snapshot(event);
            self.queue.enqueue(snapshot);
            deadline
        };

        tracing::info!(duration_secs = duration.as_secs(), "Voting started");

        let ledger = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(ledger) = ledger.upgrade() {
                ledger.end_voting().await;
            }
        });

        Ok(deadline)
    }

    /// Close voting
    ///
    /// Safe to call any number of times; only the call that performs the
    /// transition emits the final snapshot. Returns whether it did.
    pub async fn end_voting(&self) -> bool {
        let mut state = self.state.lock().await;
        if !state.end_voting() {
            return false;
        }

        let snapshot = state.next_snapshot(SnapshotEvent::VotingEnded);
        tracing::info!(tally = %snapshot.tally, seq = snapshot.seq_num, "Voting ended");
        self.queue.enqueue(snapshot);
        true
    }

    /// Current phase, time left and (once ended) the final tally
    pub async fn status(&self) -> StatusReport {
        self.state.lock().await.status(Instant::now())
    }

    /// Point-in-time copy of every registered endpoint
    pub async fn endpoints(&self) -> Vec<SocketAddr> {
        self.state.lock().await.clients().all_endpoints()
    }

    pub async fn lookup(&self, client_id: &str) -> Option<SocketAddr> {
        self.state.lock().await.clients().lookup(client_id)
    }

    /// Copy of the live tally
    pub async fn tally(&self) -> Tally {
        self.state.lock().await.ballots().tally().clone()
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase()
    }

    pub async fn ballot_count(&self) -> usize {
        self.state.lock().await.ballots().ballot_count()
    }

    pub async fn client_count(&self) -> usize {
        self.state.lock().await.clients().len()
    }

    /// Last sequence number handed out
    pub async fn broadcast_seq(&self) -> u64 {
        self.state.lock().await.broadcast_seq()
    }
}
