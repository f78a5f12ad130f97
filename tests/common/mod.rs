//! Test helpers for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use classchat::config::DiscoveryConfig;
use classchat::Envelope;

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Discovery settings bound to an ephemeral loopback port.
pub fn loopback_discovery() -> DiscoveryConfig {
    DiscoveryConfig {
        bind_host: "127.0.0.1".to_string(),
        port: 0,
        ..DiscoveryConfig::default()
    }
}

/// Take every envelope currently queued on `receiver`.
pub fn drain(receiver: &mut UnboundedReceiver<Envelope>) -> Vec<Envelope> {
    let mut envelopes = Vec::new();
    while let Ok(envelope) = receiver.try_recv() {
        envelopes.push(envelope);
    }
    envelopes
}
