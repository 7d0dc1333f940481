//! Voting client
//!
//! Provides the client side of the protocol for:
//! - Registering and casting votes against a [`crate::server::VotingServer`]
//! - Counting ghost votes and broadcast sequence gaps

pub mod connector;
pub mod tracker;

pub use connector::VoteClient;
pub use tracker::DeliveryTracker;
