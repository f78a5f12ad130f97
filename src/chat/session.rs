//! Per-endpoint chat session.

use chrono::{DateTime, Utc};

use super::message::{ChatMessage, DeliveryStatus};

/// Presence of a remote participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresenceStatus {
    #[default]
    Online,
    Away,
    Typing,
}

impl PresenceStatus {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceStatus::Online => "Online",
            PresenceStatus::Away => "Away",
            PresenceStatus::Typing => "Typing...",
        }
    }

    /// Integer code carried in status updates.
    pub fn code(&self) -> i64 {
        match self {
            PresenceStatus::Online => 0,
            PresenceStatus::Away => 1,
            PresenceStatus::Typing => 2,
        }
    }

    /// Decode an integer code; unknown codes fall back to `Online`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => PresenceStatus::Away,
            2 => PresenceStatus::Typing,
            _ => PresenceStatus::Online,
        }
    }
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Chat state for one remote endpoint.
///
/// `unread_count` always equals the number of messages in the history that
/// were not sent by the teacher console and are not yet `Read`.
#[derive(Debug, Clone)]
pub struct ChatSession {
    client_id: String,
    client_name: String,
    status: PresenceStatus,
    history: Vec<ChatMessage>,
    unread_count: usize,
    last_activity: DateTime<Utc>,
    history_limit: Option<usize>,
}

impl ChatSession {
    /// Create a session named after its identity.
    pub fn new(client_id: impl Into<String>) -> Self {
        let client_id = client_id.into();
        Self::with_name(client_id.clone(), client_id)
    }

    /// Create a session with an explicit display name.
    pub fn with_name(client_id: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_name: client_name.into(),
            status: PresenceStatus::Online,
            history: Vec::new(),
            unread_count: 0,
            last_activity: Utc::now(),
            history_limit: None,
        }
    }

    /// Keep at most `limit` messages, dropping the oldest first.
    pub fn set_history_limit(&mut self, limit: Option<usize>) {
        self.history_limit = limit.filter(|l| *l > 0);
        self.enforce_history_limit();
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn set_client_name(&mut self, name: impl Into<String>) {
        self.client_name = name.into();
    }

    pub fn status(&self) -> PresenceStatus {
        self.status
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    pub fn has_unread_messages(&self) -> bool {
        self.unread_count > 0
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Overwrite the presence status. Any status may follow any other.
    pub fn set_status(&mut self, status: PresenceStatus) {
        self.status = status;
        self.touch();
    }

    /// Append a message to the history.
    pub fn add_message(&mut self, message: ChatMessage) {
        if counts_as_unread(&message) {
            self.unread_count += 1;
        }
        self.history.push(message);
        self.touch();
        self.enforce_history_limit();
    }

    /// Mark every message as read.
    pub fn mark_all_as_read(&mut self) {
        self.unread_count = 0;
        for message in &mut self.history {
            message.set_status(DeliveryStatus::Read);
        }
    }

    /// Set the status of the first message with the given id.
    ///
    /// Returns false, leaving the session untouched, if no message matches.
    pub fn update_message_status(&mut self, message_id: &str, status: DeliveryStatus) -> bool {
        let Some(message) = self.history.iter_mut().find(|m| m.id() == message_id) else {
            return false;
        };

        message.set_status(status);
        self.recount_unread();
        self.touch();
        true
    }

    /// Drop the whole history. Presence is not affected.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.unread_count = 0;
        self.touch();
    }

    /// Label for a client list, e.g. `"Room 12 (2 new)"`.
    pub fn display_label(&self) -> String {
        if self.has_unread_messages() {
            format!("{} ({} new)", self.client_name, self.unread_count)
        } else {
            self.client_name.clone()
        }
    }

    fn recount_unread(&mut self) {
        self.unread_count = self.history.iter().filter(|m| counts_as_unread(m)).count();
    }

    fn enforce_history_limit(&mut self) {
        if let Some(limit) = self.history_limit {
            if self.history.len() > limit {
                let excess = self.history.len() - limit;
                self.history.drain(..excess);
                self.recount_unread();
            }
        }
    }

    fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

fn counts_as_unread(message: &ChatMessage) -> bool {
    !message.is_from_master() && message.status() != DeliveryStatus::Read
}
