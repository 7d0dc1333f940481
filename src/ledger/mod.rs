//! Shared voting ledger
//!
//! The client registry, the ballot store and the phase controller share one
//! lock, so the four-step vote check and every phase transition are atomic
//! with respect to each other.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<Ledger>
//!               ┌───────────────────────────┐
//!               │ Mutex<VotingState {       │
//!               │   clients,                │
//!               │   ballots + tally,        │
//!               │   phase + deadline,       │
//!               │   broadcast_seq,          │
//!               │ }>                        │
//!               │ queue: BroadcastQueue ────┼──► BroadcastWorker
//!               └─────────────┬─────────────┘
//!                             │
//!         ┌───────────────────┼───────────────────┐
//!         ▼                   ▼                   ▼
//!     register()         cast_vote()     start_voting()/end_voting()
//! ```

pub mod error;
pub mod state;
pub mod store;

pub use error::VoteError;
pub use state::{StatusReport, VotingState};
pub use store::Ledger;
