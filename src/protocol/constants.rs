//! Wire and server constants

/// Well-known server port
pub const DEFAULT_PORT: u16 = 9000;

/// Default number of snapshots the broadcast queue holds before dropping
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Receive buffer size; large enough for any UDP datagram
pub const MAX_DATAGRAM_SIZE: usize = 65536;

/// Options offered when none are configured
pub const DEFAULT_OPTIONS: [&str; 3] = ["A", "B", "C"];

/// Leading text of the ACK that confirms a vote
pub const VOTE_ACK_PREFIX: &str = "vote recorded";
