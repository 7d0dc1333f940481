//! Client registry implementation
//!
//! Maps client identifiers to the endpoint they registered from. The
//! registry holds no lock of its own: it is one part of the shared voting
//! state and is only reached through [`crate::ledger::Ledger`].

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::ledger::VoteError;

use super::entry::ClientRecord;

/// Identifier to endpoint map with first-writer-wins semantics
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<String, ClientRecord>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client
    ///
    /// Fails with [`VoteError::AlreadyRegistered`] if the identifier is taken.
    /// The stored endpoint is never replaced.
    pub fn register(&mut self, client_id: &str, endpoint: SocketAddr) -> Result<(), VoteError> {
        if self.clients.contains_key(client_id) {
            return Err(VoteError::AlreadyRegistered);
        }

        let record = ClientRecord::new(client_id, endpoint);
        self.clients.insert(record.client_id.clone(), record);
        Ok(())
    }

    /// Look up the endpoint of a client
    pub fn lookup(&self, client_id: &str) -> Option<SocketAddr> {
        self.clients.get(client_id).map(|record| record.endpoint)
    }

    /// Check whether an identifier is registered
    pub fn contains(&self, client_id: &str) -> bool {
        self.clients.contains_key(client_id)
    }

    /// Point-in-time copy of every registered endpoint
    pub fn all_endpoints(&self) -> Vec<SocketAddr> {
        self.clients.values().map(|record| record.endpoint).collect()
    }

    /// Number of registered clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
