//! Crate-level error type
//!
//! Transport and wire-format failures. Vote and registration rejections are
//! ordinary outcomes and live in [`crate::ledger::VoteError`] instead.

/// Error type for socket and codec operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Inbound datagram could not be decoded as an envelope
    #[error("malformed packet: {0}")]
    MalformedPacket(#[source] serde_json::Error),

    /// Outbound envelope could not be encoded
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
