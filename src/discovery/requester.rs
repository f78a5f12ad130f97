//! Sending chat requests from a student machine.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::{info, warn};

use super::request::ChatRequest;
use crate::config::DiscoveryConfig;
use crate::{ChatError, Result};

/// Sends one chat-request datagram per call.
///
/// There is no retry and no acknowledgement. A lost datagram means the
/// request is never seen.
#[derive(Debug, Clone)]
pub struct ChatRequester {
    target: SocketAddr,
    host: String,
    user: String,
}

impl ChatRequester {
    /// Create a requester for an explicit destination.
    pub fn new(target: SocketAddr, host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            target,
            host: host.into(),
            user: user.into(),
        }
    }

    /// Create a requester from the discovery settings.
    ///
    /// The host name comes from the configuration when set, otherwise from
    /// the environment.
    pub fn from_config(config: &DiscoveryConfig) -> Result<Self> {
        let ip: IpAddr = config.broadcast_address.parse().map_err(|_| {
            ChatError::Config(format!(
                "invalid broadcast address: {}",
                config.broadcast_address
            ))
        })?;
        let host = if config.host_name.is_empty() {
            local_host_name()
        } else {
            config.host_name.clone()
        };
        Ok(Self::new(
            SocketAddr::new(ip, config.port),
            host,
            local_user_name(),
        ))
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// The payload the next `send` would carry.
    pub fn request(&self) -> ChatRequest {
        ChatRequest::new(self.host.as_str(), self.user.as_str())
    }

    /// Broadcast a chat request. Returns the number of bytes sent.
    pub async fn send(&self) -> Result<usize> {
        let local: SocketAddr = if self.target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.set_broadcast(true)?;

        let data = self.request().to_bytes()?;
        let sent = socket.send_to(&data, self.target).await?;
        info!("Sent chat request as {:?} to {}", self.host, self.target);
        Ok(sent)
    }
}

/// Best-effort host name of this machine; empty if unknown.
pub fn local_host_name() -> String {
    for var in ["COMPUTERNAME", "HOSTNAME"] {
        if let Ok(name) = std::env::var(var) {
            if !name.trim().is_empty() {
                return name.trim().to_string();
            }
        }
    }
    let name = std::fs::read_to_string("/etc/hostname")
        .map(|name| name.trim().to_string())
        .unwrap_or_default();
    if name.is_empty() {
        warn!("Could not detect the host name; set discovery.host_name or chat.client_id");
    }
    name
}

/// Best-effort name of the logged-in user; empty if unknown.
pub fn local_user_name() -> String {
    std::env::var("USERNAME")
        .ok()
        .filter(|name| !name.is_empty())
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_default()
}
