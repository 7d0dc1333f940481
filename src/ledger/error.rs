//! Rejection reasons for registry and vote operations
//!
//! The `Display` text is what the client sees in the ERROR reply.

/// Why a registration, vote or phase change was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoteError {
    /// Identifier already belongs to another registration
    #[error("client id already in use")]
    AlreadyRegistered,

    /// Vote from an identifier that never registered
    #[error("not registered")]
    NotRegistered,

    /// Vote outside the active window
    #[error("voting is not active")]
    VotingNotActive,

    /// Client already has a ballot
    #[error("duplicate vote")]
    DuplicateVote,

    /// Option is not one of the configured options
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// Voting can only be started once
    #[error("voting already started")]
    AlreadyStarted,
}
