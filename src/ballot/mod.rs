//! Ballots, tally and the voting phase
//!
//! Both halves are plain single-threaded state. They are coupled under one
//! lock by [`crate::ledger::Ledger`], which runs the full vote check as a
//! single critical section.

pub mod phase;
pub mod store;

pub use phase::{Phase, PhaseController, MAX_VOTING_WINDOW};
pub use store::{BallotStore, Tally};
