//! Result broadcast pipeline
//!
//! Tally snapshots travel from the request path to the network through a
//! bounded queue with one dedicated consumer:
//!
//! ```text
//!   [vote handler]   [phase timer]   [vote handler]
//!         │                │                │
//!         └──── enqueue() (try_send, drop on full) ────┐
//!                                                      ▼
//!                                        mpsc::channel(capacity)
//!                                                      │
//!                                                      ▼
//!                                             BroadcastWorker
//!                                   for each endpoint: send_to() ──► UDP
//! ```
//!
//! Producers never wait on the queue, so a slow or unreachable receiver can
//! only cost dropped snapshots, never stalled votes.

pub mod queue;
pub mod sink;
pub mod snapshot;

pub use queue::{BroadcastQueue, BroadcastWorker};
pub use sink::DatagramSink;
pub use snapshot::{BroadcastSnapshot, SnapshotEvent};
