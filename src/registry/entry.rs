//! Client record type

use std::net::SocketAddr;

/// A registered client
///
/// Created on the first successful registration and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    /// Identifier chosen by the client
    pub client_id: String,

    /// Endpoint the registration arrived from
    pub endpoint: SocketAddr,
}

impl ClientRecord {
    /// Create a new record
    pub fn new(client_id: impl Into<String>, endpoint: SocketAddr) -> Self {
        Self {
            client_id: client_id.into(),
            endpoint,
        }
    }
}
