//! Voting phase state machine
//!
//! ```text
//! NotStarted --start(d)--> Active --(deadline | end())--> Ended
//! ```
//!
//! Each edge fires at most once and `Ended` is terminal.

use std::time::Duration;

use tokio::time::Instant;

use crate::ledger::VoteError;

/// Longest voting window; longer requests are clamped to it
pub const MAX_VOTING_WINDOW: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Voting lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Registrations accepted, votes rejected
    NotStarted,
    /// Votes accepted until the deadline
    Active,
    /// Terminal; results are final
    Ended,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::NotStarted => "NOT_STARTED",
            Phase::Active => "ACTIVE",
            Phase::Ended => "ENDED",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase plus the deadline that bounds the active window
#[derive(Debug)]
pub struct PhaseController {
    phase: Phase,
    /// Set on start; only meaningful while Active
    deadline: Option<Instant>,
}

impl PhaseController {
    pub fn new() -> Self {
        Self {
            phase: Phase::NotStarted,
            deadline: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Open the voting window at `now` for `duration`
    ///
    /// Only legal from `NotStarted`. Returns the deadline. `duration` is
    /// clamped to [`MAX_VOTING_WINDOW`].
    pub fn start(&mut self, duration: Duration, now: Instant) -> Result<Instant, VoteError> {
        if self.phase != Phase::NotStarted {
            return Err(VoteError::AlreadyStarted);
        }

        let window = duration.min(MAX_VOTING_WINDOW);
        let deadline = now.checked_add(window).unwrap_or(now);
        self.phase = Phase::Active;
        self.deadline = Some(deadline);
        Ok(deadline)
    }

    /// Close the voting window
    ///
    /// Returns true only on the call that performs the transition; any other
    /// call is a no-op.
    pub fn end(&mut self) -> bool {
        if self.phase != Phase::Active {
            return false;
        }

        self.phase = Phase::Ended;
        true
    }

    /// Whether a vote arriving at `now` may be accepted
    ///
    /// Checks the deadline itself rather than trusting the phase flag alone:
    /// the scheduled end may not have run yet. `now >= deadline` rejects.
    pub fn accepts_votes(&self, now: Instant) -> bool {
        match (self.phase, self.deadline) {
            (Phase::Active, Some(deadline)) => now < deadline,
            _ => false,
        }
    }

    /// Time left in the active window
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        match (self.phase, self.deadline) {
            (Phase::Active, Some(deadline)) => Some(deadline.saturating_duration_since(now)),
            _ => None,
        }
    }
}

impl Default for PhaseController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    #[test]
    fn test_lifecycle() {
        let t0 = Instant::now();
        let mut phase = PhaseController::new();

        assert_eq!(phase.phase(), Phase::NotStarted);
        assert!(!phase.accepts_votes(t0));

        let deadline = assert_ok!(phase.start(Duration::from_secs(5), t0));
        assert_eq!(deadline, t0 + Duration::from_secs(5));
        assert_eq!(phase.phase(), Phase::Active);
        assert!(phase.accepts_votes(t0 + Duration::from_secs(1)));

        assert!(phase.end());
        assert_eq!(phase.phase(), Phase::Ended);
        assert!(!phase.accepts_votes(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_deadline_is_exclusive() {
        let t0 = Instant::now();
        let mut phase = PhaseController::new();
        phase.start(Duration::from_secs(5), t0).unwrap();

        assert!(phase.accepts_votes(t0 + Duration::from_millis(4999)));
        assert!(!phase.accepts_votes(t0 + Duration::from_secs(5)));
        assert!(!phase.accepts_votes(t0 + Duration::from_millis(5001)));

        // Flag is still Active; only the lazy check rejected
        assert_eq!(phase.phase(), Phase::Active);
    }

    #[test]
    fn test_end_is_idempotent() {
        let t0 = Instant::now();
        let mut phase = PhaseController::new();

        // Ending before start does nothing
        assert!(!phase.end());
        assert_eq!(phase.phase(), Phase::NotStarted);

        phase.start(Duration::from_secs(5), t0).unwrap();
        assert!(phase.end());
        assert!(!phase.end());
        assert_eq!(phase.phase(), Phase::Ended);
    }

    #[test]
    fn test_no_restart() {
        let t0 = Instant::now();
        let mut phase = PhaseController::new();
        phase.start(Duration::from_secs(5), t0).unwrap();

        let err = assert_err!(phase.start(Duration::from_secs(10), t0));
        assert_eq!(err, VoteError::AlreadyStarted);
        assert_eq!(phase.deadline(), Some(t0 + Duration::from_secs(5)));

        phase.end();
        assert_err!(phase.start(Duration::from_secs(10), t0));
        assert_eq!(phase.phase(), Phase::Ended);
    }

    #[test]
    fn test_huge_duration_is_clamped() {
        let t0 = Instant::now();
        let mut phase = PhaseController::new();

        let deadline = assert_ok!(phase.start(Duration::from_secs(u64::MAX), t0));
        assert_eq!(deadline, t0 + MAX_VOTING_WINDOW);
        assert!(phase.accepts_votes(t0 + Duration::from_secs(3600)));
        assert_eq!(phase.remaining(t0), Some(MAX_VOTING_WINDOW));
    }

    #[test]
    fn test_remaining() {
        let t0 = Instant::now();
        let mut phase = PhaseController::new();
        assert_eq!(phase.remaining(t0), None);

        phase.start(Duration::from_secs(5), t0).unwrap();
        assert_eq!(
            phase.remaining(t0 + Duration::from_secs(2)),
            Some(Duration::from_secs(3))
        );
        assert_eq!(
            phase.remaining(t0 + Duration::from_secs(9)),
            Some(Duration::ZERO)
        );
    }
}
