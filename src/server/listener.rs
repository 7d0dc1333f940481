//! Voting server listener
//!
//! Owns the UDP socket, runs the receive loop and spawns one task per
//! datagram.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::broadcast::BroadcastQueue;
use crate::error::Result;
use crate::ledger::{Ledger, VoteError};
use crate::protocol::Message;
use crate::server::config::ServerConfig;
use crate::server::dispatcher::Dispatcher;
use crate::stats::{ServerMetrics, ServerStats};

/// UDP voting server
///
/// The broadcast worker starts in [`VotingServer::bind`] and is aborted
/// when the server is dropped.
pub struct VotingServer {
    config: ServerConfig,
    socket: Arc<UdpSocket>,
    ledger: Arc<Ledger>,
    dispatcher: Dispatcher,
    metrics: Arc<ServerMetrics>,
    broadcast_handle: JoinHandle<()>,
}

impl VotingServer {
    /// Bind the socket and start the broadcast worker
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let socket = Arc::new(UdpSocket::bind(config.bind_addr).await?);
        let metrics = Arc::new(ServerMetrics::new());

        let (queue, worker) =
            BroadcastQueue::channel(config.broadcast_queue_capacity, Arc::clone(&metrics));
        let ledger = Arc::new(Ledger::new(config.options.iter().cloned(), queue));
        let dispatcher = Dispatcher::new(Arc::clone(&ledger), Arc::clone(&metrics));

        let broadcast_handle = worker
            .with_padding(config.broadcast_padding)
            .spawn(Arc::clone(&socket), &ledger);

        tracing::info!(
            addr = %socket.local_addr()?,
            options = ?config.options,
            queue_capacity = config.broadcast_queue_capacity,
            "Voting server bound"
        );

        Ok(Self {
            config,
            socket,
            ledger,
            dispatcher,
            metrics,
            broadcast_handle,
        })
    }

    /// Address the socket is actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get a reference to the shared ledger
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Current counters
    pub fn stats(&self) -> ServerStats {
        self.metrics.snapshot()
    }

    /// Open voting for `duration`; see [`Ledger::start_voting`]
    pub async fn start_voting(&self, duration: Duration) -> std::result::Result<Instant, VoteError> {
        self.ledger.start_voting(duration).await
    }

    /// Close voting early; see [`Ledger::end_voting`]
    pub async fn end_voting(&self) -> bool {
        self.ledger.end_voting().await
    }

    /// Run the receive loop
    ///
    /// Runs until the task is cancelled: receive errors are logged and the
    /// loop carries on. Use [`VotingServer::run_until`] for a clean stop.
    pub async fn run(&self) -> Result<()> {
        self.recv_loop().await
    }

    /// Run the receive loop until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.recv_loop() => result,
        }
    }

    async fn recv_loop(&self) -> Result<()> {
        let mut buf = vec![0u8; self.config.max_datagram_size];

        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((len, peer)) => {
                    self.handle_packet(Bytes::copy_from_slice(&buf[..len]), peer);
                }
                Err(e) => {
                    // ICMP errors from earlier sends surface here on some platforms
                    tracing::error!(error = %e, "Failed to receive datagram");
                }
            }
        }
    }

    fn handle_packet(&self, data: Bytes, peer: SocketAddr) {
        let dispatcher = self.dispatcher.clone();
        let socket = Arc::clone(&self.socket);

        tokio::spawn(async move {
            if let Some(reply) = dispatcher.dispatch(&data, peer).await {
                send_reply(&socket, &reply, peer).await;
            }
        });
    }
}

impl Drop for VotingServer {
    fn drop(&mut self) {
        self.broadcast_handle.abort();
    }
}

async fn send_reply(socket: &UdpSocket, reply: &Message, peer: SocketAddr) {
    let data = match reply.encode() {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(peer = %peer, error = %e, "Failed to encode reply");
            return;
        }
    };

    if let Err(e) = socket.send_to(&data, peer).await {
        tracing::debug!(peer = %peer, error = %e, "Reply send failed");
    }
}
