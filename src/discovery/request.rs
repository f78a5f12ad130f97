//! The chat-request datagram.

use std::net::IpAddr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// Value of the `type` field of a chat request.
pub const CHAT_REQUEST_TYPE: &str = "chat_request";

/// Payload of a chat-request datagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(rename = "type")]
    pub kind: String,
    /// Host name of the sender; may be empty.
    pub host: String,
    /// Best-effort user name of the sender.
    pub user: String,
    /// ISO 8601 UTC send time.
    pub ts: String,
}

impl ChatRequest {
    /// Create a request stamped with the current time.
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self::at(host, user, Utc::now())
    }

    /// Create a request stamped with `time`.
    pub fn at(host: impl Into<String>, user: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            kind: CHAT_REQUEST_TYPE.to_string(),
            host: host.into(),
            user: user.into(),
            ts: time.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Compact JSON bytes for the datagram.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a datagram.
    ///
    /// Returns `None` unless the datagram is a JSON object whose `type` is
    /// `chat_request`. Other fields that are missing or not strings read as
    /// empty.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let value: Value = serde_json::from_slice(data).ok()?;
        let object = value.as_object()?;
        if object.get("type").and_then(Value::as_str) != Some(CHAT_REQUEST_TYPE) {
            return None;
        }

        let field = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Some(Self {
            kind: CHAT_REQUEST_TYPE.to_string(),
            host: field("host"),
            user: field("user"),
            ts: field("ts"),
        })
    }

    /// Identity to open a chat with: the announced host, or the source
    /// address when no host was announced.
    pub fn identity(&self, peer: IpAddr) -> String {
        if self.host.is_empty() {
            peer.to_string()
        } else {
            self.host.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_request_payload_layout() {
        let time = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let request = ChatRequest::at("room-12", "alice", time);
        let value: Value = serde_json::from_slice(&request.to_bytes().unwrap()).unwrap();

        assert_eq!(value["type"], "chat_request");
        assert_eq!(value["host"], "room-12");
        assert_eq!(value["user"], "alice");
        assert_eq!(value["ts"], "2025-01-01T00:00:00Z");
    }

    #[test]
    fn test_parse_valid_request() {
        let data = br#"{"type":"chat_request","host":"room-12","user":"alice","ts":"2025-01-01T00:00:00Z"}"#;
        let request = ChatRequest::parse(data).unwrap();

        assert_eq!(request.host, "room-12");
        assert_eq!(request.user, "alice");
        assert_eq!(request.ts, "2025-01-01T00:00:00Z");
    }

    #[test]
    fn test_parse_rejects_other_types() {
        let data = br#"{"type":"ping","host":"room-12","user":"alice","ts":"2025-01-01T00:00:00Z"}"#;
        assert!(ChatRequest::parse(data).is_none());
        assert!(ChatRequest::parse(br#"{"host":"room-12"}"#).is_none());
        assert!(ChatRequest::parse(br#"{"type":7}"#).is_none());
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(ChatRequest::parse(b"").is_none());
        assert!(ChatRequest::parse(b"chat_request").is_none());
        assert!(ChatRequest::parse(br#"["chat_request"]"#).is_none());
        assert!(ChatRequest::parse(b"\xff\xfe").is_none());
    }

    #[test]
    fn test_parse_lenient_fields() {
        let request = ChatRequest::parse(br#"{"type":"chat_request","host":12}"#).unwrap();
        assert_eq!(request.host, "");
        assert_eq!(request.user, "");
        assert_eq!(request.ts, "");
    }

    #[test]
    fn test_identity_prefers_host() {
        let peer: IpAddr = "192.168.1.40".parse().unwrap();

        let named = ChatRequest::new("room-12", "alice");
        assert_eq!(named.identity(peer), "room-12");

        let anonymous = ChatRequest::new("", "alice");
        assert_eq!(anonymous.identity(peer), "192.168.1.40");
    }
}
