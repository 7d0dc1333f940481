//! Voting client
//!
//! Thin wrapper over a connected UDP socket. Sends are fire-and-forget;
//! every received message passes through the [`DeliveryTracker`].

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;

use crate::error::Result;
use crate::protocol::constants::MAX_DATAGRAM_SIZE;
use crate::protocol::Message;

use super::tracker::DeliveryTracker;

/// Client for one voter identity
///
/// # Example
/// ```no_run
/// use udp_vote::client::VoteClient;
///
/// # async fn example() -> udp_vote::error::Result<()> {
/// let mut client = VoteClient::connect("127.0.0.1:9000".parse().unwrap(), "alice").await?;
/// client.register().await?;
/// client.vote("A").await?;
///
/// let reply = client.recv().await?;
/// println!("{:?}: {:?}", reply.kind, reply.message);
/// # Ok(())
/// # }
/// ```
pub struct VoteClient {
    socket: UdpSocket,
    client_id: String,
    tracker: DeliveryTracker,
    buf: Vec<u8>,
}

impl VoteClient {
    /// Bind an ephemeral port and connect it to `server`
    pub async fn connect(server: SocketAddr, client_id: impl Into<String>) -> Result<Self> {
        let local = match server {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(server).await?;

        Ok(Self {
            socket,
            client_id: client_id.into(),
            tracker: DeliveryTracker::new(),
            buf: vec![0u8; MAX_DATAGRAM_SIZE],
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn tracker(&self) -> &DeliveryTracker {
        &self.tracker
    }

    /// Send a REGISTER for this client's identifier
    pub async fn register(&self) -> Result<()> {
        self.send(&Message::register(&self.client_id)).await
    }

    /// Send a VOTE for `option`
    pub async fn vote(&mut self, option: &str) -> Result<()> {
        self.send(&Message::vote(&self.client_id, option)).await?;
        self.tracker.record_vote_sent();
        Ok(())
    }

    /// Wait for the next decodable message
    ///
    /// Undecodable datagrams are skipped.
    pub async fn recv(&mut self) -> Result<Message> {
        loop {
            let len = self.socket.recv(&mut self.buf).await?;

            match Message::decode(&self.buf[..len]) {
                Ok(msg) => {
                    self.tracker.observe(&msg);
                    return Ok(msg);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping undecodable datagram");
                }
            }
        }
    }

    async fn send(&self, msg: &Message) -> Result<()> {
        let data = msg.encode()?;
        self.socket.send(&data).await?;
        Ok(())
    }
}
