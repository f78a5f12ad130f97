//! UDP listener for chat requests on the teacher console.

use std::net::{IpAddr, SocketAddr};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::request::ChatRequest;
use crate::config::DiscoveryConfig;
use crate::{ChatError, Result};

/// Largest datagram accepted.
const MAX_DATAGRAM_SIZE: usize = 65_535;

/// A valid chat request and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredRequest {
    /// Identity the chat should be opened with.
    pub identity: String,
    pub request: ChatRequest,
    pub peer: SocketAddr,
}

/// Listener for chat-request datagrams.
pub struct DiscoveryListener {
    socket: UdpSocket,
}

impl DiscoveryListener {
    /// Bind the listener with address reuse enabled, so several consoles on
    /// one machine can share the port.
    pub async fn bind(config: &DiscoveryConfig) -> Result<Self> {
        let ip: IpAddr = config.bind_host.parse().map_err(|_| {
            ChatError::Config(format!("invalid discovery bind host: {}", config.bind_host))
        })?;
        let addr = SocketAddr::new(ip, config.port);

        let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;

        let socket = UdpSocket::from_std(socket.into())?;
        info!("Listening for chat requests on {}", socket.local_addr()?);

        Ok(Self { socket })
    }

    /// Get the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Wait for the next valid chat request.
    ///
    /// Datagrams that are not chat requests are dropped without surfacing an
    /// error.
    pub async fn recv_request(&self) -> Result<DiscoveredRequest> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        self.recv_into(&mut buf).await
    }

    async fn recv_into(&self, buf: &mut [u8]) -> Result<DiscoveredRequest> {
        loop {
            let (len, peer) = self.socket.recv_from(buf).await?;
            match ChatRequest::parse(&buf[..len]) {
                Some(request) => {
                    let identity = request.identity(peer.ip());
                    info!(
                        "Chat requested from {} (user {:?}, via {})",
                        identity, request.user, peer
                    );
                    return Ok(DiscoveredRequest {
                        identity,
                        request,
                        peer,
                    });
                }
                None => debug!("Dropping {} byte datagram from {}", len, peer),
            }
        }
    }

    /// Forward chat requests into `sender` until the receiver is dropped.
    ///
    /// Read errors are logged and the listener keeps going.
    pub async fn run(self, sender: mpsc::Sender<DiscoveredRequest>) {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            match self.recv_into(&mut buf).await {
                Ok(request) => {
                    if sender.send(request).await.is_err() {
                        debug!("Chat request receiver closed, stopping listener");
                        return;
                    }
                }
                Err(e) => error!("Failed to receive chat request: {}", e),
            }
        }
    }
}
