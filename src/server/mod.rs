//! UDP voting server
//!
//! [`VotingServer`] binds the well-known port, hands each datagram to the
//! [`Dispatcher`] on its own task and owns the broadcast worker.

pub mod config;
pub mod dispatcher;
pub mod listener;

pub use config::ServerConfig;
pub use dispatcher::Dispatcher;
pub use listener::VotingServer;
