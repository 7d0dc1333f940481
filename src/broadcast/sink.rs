//! Datagram sink abstraction
//!
//! The fan-out worker only needs "send these bytes to that address". Keeping
//! it behind a trait lets tests observe, stall or fail deliveries without a
//! real socket.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

/// Fire-and-forget datagram sender
pub trait DatagramSink: Send + Sync + 'static {
    /// Send one datagram to `target`
    fn send_to(&self, buf: &[u8], target: SocketAddr)
        -> impl Future<Output = io::Result<usize>> + Send;
}

impl DatagramSink for UdpSocket {
    fn send_to(
        &self,
        buf: &[u8],
        target: SocketAddr,
    ) -> impl Future<Output = io::Result<usize>> + Send {
        UdpSocket::send_to(self, buf, target)
    }
}
