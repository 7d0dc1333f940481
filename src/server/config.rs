//! Server configuration

use std::net::SocketAddr;

use crate::protocol::constants::*;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the UDP socket to
    pub bind_addr: SocketAddr,

    /// Options voters can choose from
    pub options: Vec<String>,

    /// Snapshots the broadcast queue holds before it starts dropping
    pub broadcast_queue_capacity: usize,

    /// Receive buffer size; longer datagrams are truncated by the OS
    pub max_datagram_size: usize,

    /// Filler bytes appended to every broadcast (0 = none)
    pub broadcast_padding: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            options: DEFAULT_OPTIONS.iter().map(|o| o.to_string()).collect(),
            broadcast_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_datagram_size: MAX_DATAGRAM_SIZE,
            broadcast_padding: 0,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the voting options
    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Set the broadcast queue capacity (at least 1)
    pub fn broadcast_queue_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_queue_capacity = capacity.max(1);
        self
    }

    /// Set the receive buffer size
    pub fn max_datagram_size(mut self, size: usize) -> Self {
        self.max_datagram_size = size.clamp(1, MAX_DATAGRAM_SIZE);
        self
    }

    /// Inflate every broadcast by `bytes` filler bytes
    pub fn broadcast_padding(mut self, bytes: usize) -> Self {
        self.broadcast_padding = bytes;
        self
    }
}
