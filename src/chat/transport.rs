//! Delivery of feature messages to remote endpoints.

use tokio::sync::mpsc;
use tracing::warn;

use super::command::FeatureMessage;

/// Where a feature message is going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// One student endpoint.
    Client(String),
    /// The teacher console.
    Master,
    /// Every connected student endpoint.
    All,
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Client(id) => write!(f, "client:{id}"),
            Target::Master => write!(f, "master"),
            Target::All => write!(f, "all"),
        }
    }
}

/// Host transport.
///
/// Delivery is fire-and-forget: there is no acknowledgement and no error for
/// the caller to handle.
pub trait Transport {
    fn deliver(&mut self, target: Target, message: FeatureMessage);
}

/// An addressed feature message.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub target: Target,
    pub message: FeatureMessage,
}

/// Transport that hands envelopes to a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: mpsc::UnboundedSender<Envelope>,
}

impl ChannelTransport {
    /// Create a transport and the receiver its envelopes arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Transport for ChannelTransport {
    fn deliver(&mut self, target: Target, message: FeatureMessage) {
        if self.sender.send(Envelope { target, message }).is_err() {
            warn!("Transport channel closed, dropping feature message");
        }
    }
}

/// Transport that keeps every envelope in memory.
impl Transport for Vec<Envelope> {
    fn deliver(&mut self, target: Target, message: FeatureMessage) {
        self.push(Envelope { target, message });
    }
}
