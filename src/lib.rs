//! Datagram-based voting service
//!
//! Clients register and vote over UDP; the server validates every ballot
//! against one shared ledger and keeps republishing tally snapshots to all
//! registered endpoints. Nothing is retransmitted: lost replies show up as
//! ghost votes on the client, and lost or dropped snapshots as gaps in the
//! broadcast sequence numbers.
//!
//! # Example
//! ```no_run
//! use std::time::Duration;
//! use udp_vote::{ServerConfig, VotingServer};
//!
//! # async fn example() -> udp_vote::error::Result<()> {
//! let server = VotingServer::bind(ServerConfig::default().options(["A", "B", "C"])).await?;
//! server.start_voting(Duration::from_secs(60)).await.ok();
//! server.run().await
//! # }
//! ```

pub mod ballot;
pub mod broadcast;
pub mod client;
pub mod error;
pub mod ledger;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod stats;

pub use ballot::{Phase, Tally};
pub use error::{Error, Result};
pub use ledger::{Ledger, StatusReport, VoteError};
pub use protocol::{Message, MessageType};
pub use server::{ServerConfig, VotingServer};
