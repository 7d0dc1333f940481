//! Datagram envelope
//!
//! Every datagram carries one flat JSON object. Fields are order-independent
//! and optional ones are left out when absent:
//!
//! ```text
//! {"type":"VOTE","client_id":"alice","vote":"A"}
//! {"type":"BROADCAST","vote_counts":{"A":1,"B":0},"seq_num":2}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Declared type of a datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// Client asks to be known under an identifier
    Register,
    /// Client casts a ballot
    Vote,
    /// Server accepted the request
    Ack,
    /// Server rejected the request
    Error,
    /// Server republishes a tally snapshot
    Broadcast,
    /// Any type string this crate does not know
    #[serde(other)]
    Unknown,
}

/// Wire envelope shared by client and server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote: Option<String>,

    /// Human-readable text on ACK, ERROR and BROADCAST
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_counts: Option<BTreeMap<String, u64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_num: Option<u64>,
}

impl Message {
    fn empty(kind: MessageType) -> Self {
        Self {
            kind,
            client_id: None,
            vote: None,
            message: None,
            vote_counts: None,
            seq_num: None,
        }
    }

    /// Create a REGISTER request
    pub fn register(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..Self::empty(MessageType::Register)
        }
    }

    /// Create a VOTE request
    pub fn vote(client_id: impl Into<String>, option: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            vote: Some(option.into()),
            ..Self::empty(MessageType::Vote)
        }
    }

    /// Create an ACK reply
    pub fn ack(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
            ..Self::empty(MessageType::Ack)
        }
    }

    /// Create an ERROR reply
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
            ..Self::empty(MessageType::Error)
        }
    }

    /// Create a BROADCAST message
    pub fn broadcast(
        seq_num: u64,
        vote_counts: BTreeMap<String, u64>,
        text: Option<String>,
    ) -> Self {
        Self {
            vote_counts: Some(vote_counts),
            seq_num: Some(seq_num),
            message: text,
            ..Self::empty(MessageType::Broadcast)
        }
    }

    /// Decode a datagram payload
    pub fn decode(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(Error::MalformedPacket)
    }

    /// Encode into a datagram payload
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Error::Encode)
    }
}
