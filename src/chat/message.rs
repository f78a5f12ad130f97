//! Chat messages and their flat JSON record form.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

/// Identity of the teacher console.
pub const MASTER_ID: &str = "master";

/// Receiver marker of a broadcast as sent over the transport.
pub const BROADCAST_RECEIVER: &str = "all";

/// Receiver marker of a broadcast as recorded by the teacher console.
pub const LOCAL_BROADCAST_RECEIVER: &str = "*";

/// Message priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    #[default]
    Normal,
    Urgent,
    Announcement,
}

impl Priority {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "Normal",
            Priority::Urgent => "Urgent",
            Priority::Announcement => "Announcement",
        }
    }

    /// Integer code used in message records.
    pub fn code(&self) -> i64 {
        match self {
            Priority::Normal => 0,
            Priority::Urgent => 1,
            Priority::Announcement => 2,
        }
    }

    /// Decode an integer code; unknown codes fall back to `Normal`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Priority::Urgent,
            2 => Priority::Announcement,
            _ => Priority::Normal,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery status of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

impl DeliveryStatus {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "Sent",
            DeliveryStatus::Delivered => "Delivered",
            DeliveryStatus::Read => "Read",
        }
    }

    /// Integer code used in message records.
    pub fn code(&self) -> i64 {
        match self {
            DeliveryStatus::Sent => 0,
            DeliveryStatus::Delivered => 1,
            DeliveryStatus::Read => 2,
        }
    }

    /// Decode an integer code; unknown codes fall back to `Sent`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => DeliveryStatus::Delivered,
            2 => DeliveryStatus::Read,
            _ => DeliveryStatus::Sent,
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single chat line.
///
/// The id and priority are fixed at construction. Only the delivery status
/// changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    id: String,
    sender_id: String,
    receiver_id: String,
    content: String,
    timestamp: DateTime<Utc>,
    priority: Priority,
    status: DeliveryStatus,
}

impl ChatMessage {
    /// Create a new message with a fresh id, status `Sent` and the current time.
    pub fn new(
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        content: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            content: content.into(),
            timestamp: now_millis(),
            priority,
            status: DeliveryStatus::Sent,
        }
    }

    /// Create a broadcast from the teacher console.
    pub fn broadcast(content: impl Into<String>, priority: Priority) -> Self {
        Self::new(MASTER_ID, BROADCAST_RECEIVER, content, priority)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    pub fn receiver_id(&self) -> &str {
        &self.receiver_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn set_status(&mut self, status: DeliveryStatus) {
        self.status = status;
    }

    /// Whether the message was sent by the teacher console.
    pub fn is_from_master(&self) -> bool {
        self.sender_id == MASTER_ID
    }

    /// Whether the message is addressed to everyone.
    pub fn is_broadcast(&self) -> bool {
        self.receiver_id == BROADCAST_RECEIVER || self.receiver_id == LOCAL_BROADCAST_RECEIVER
    }

    /// Copy of this message with a different receiver, keeping id and time.
    pub fn with_receiver(&self, receiver_id: impl Into<String>) -> Self {
        Self {
            receiver_id: receiver_id.into(),
            ..self.clone()
        }
    }

    /// Time of day the message was created, `HH:MM:SS`.
    pub fn formatted_time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    /// Format the message for a chat transcript.
    pub fn format_line(&self) -> String {
        let sender = if self.is_from_master() {
            "Master"
        } else {
            &self.sender_id
        };
        format!(
            "[{}] {} ({}): {}",
            self.formatted_time(),
            sender,
            self.priority,
            self.content
        )
    }

    /// Encode as a flat record.
    pub fn to_json(&self) -> Value {
        json!({
            "messageId": self.id,
            "senderId": self.sender_id,
            "receiverId": self.receiver_id,
            "content": self.content,
            "timestamp": self.timestamp.timestamp_millis(),
            "priority": self.priority.code(),
            "status": self.status.code(),
        })
    }

    /// Decode a flat record.
    ///
    /// Never fails: a missing or mistyped field takes its zero value (empty
    /// string, epoch 0, `Normal`, `Sent`). Callers that need validation must
    /// check the decoded fields themselves.
    pub fn from_json(record: &Value) -> Self {
        Self {
            id: string_field(record, "messageId"),
            sender_id: string_field(record, "senderId"),
            receiver_id: string_field(record, "receiverId"),
            content: string_field(record, "content"),
            timestamp: DateTime::from_timestamp_millis(int_field(record, "timestamp"))
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            priority: Priority::from_code(int_field(record, "priority")),
            status: DeliveryStatus::from_code(int_field(record, "status")),
        }
    }
}

/// Current time truncated to the millisecond precision of the record form.
fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

fn string_field(record: &Value, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn int_field(record: &Value, key: &str) -> i64 {
    match record.get(key) {
        Some(value) => value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        None => 0,
    }
}
