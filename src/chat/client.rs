//! Student side of the chat.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::command::{ChatCommand, FeatureMessage};
use super::message::{ChatMessage, Priority, MASTER_ID};
use super::router::ChatEvent;
use super::session::PresenceStatus;
use super::transport::{Target, Transport};
use crate::config::Config;

/// Chat state of a student machine.
///
/// There is a single conversation, with the teacher console. Every received
/// message counts as unread until [`ClientChat::mark_read`].
pub struct ClientChat<T> {
    client_id: String,
    history: Vec<ChatMessage>,
    history_limit: Option<usize>,
    unread_count: usize,
    transport: T,
    typing_since: Option<Instant>,
    typing_timeout: Duration,
    play_sound: bool,
    show_tray: bool,
}

impl<T: Transport> ClientChat<T> {
    /// Create the chat for the student machine `client_id`.
    pub fn new(client_id: impl Into<String>, transport: T) -> Self {
        Self {
            client_id: client_id.into(),
            history: Vec::new(),
            history_limit: None,
            unread_count: 0,
            transport,
            typing_since: None,
            typing_timeout: Duration::from_millis(2000),
            play_sound: true,
            show_tray: true,
        }
    }

    /// Create the chat using the identity, history, typing and notification
    /// settings of `config`.
    pub fn from_config(transport: T, config: &Config) -> Self {
        let mut chat = Self::new(config.chat.client_identity(), transport);
        chat.history_limit = (config.chat.max_history > 0).then_some(config.chat.max_history);
        chat.typing_timeout = Duration::from_millis(config.chat.typing_timeout_ms);
        chat.play_sound = config.notifications.sound_enabled;
        chat.show_tray = config.notifications.tray_enabled;
        chat
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_typing(&self) -> bool {
        self.typing_since.is_some()
    }

    /// Decode and apply a feature message from the teacher console.
    pub fn handle_feature_message(&mut self, message: &FeatureMessage) -> Vec<ChatEvent> {
        match ChatCommand::from_feature_message(message) {
            Ok(command) => self.handle(command),
            Err(e) => {
                debug!("Ignoring feature message: {}", e);
                Vec::new()
            }
        }
    }

    /// Apply a command from the teacher console.
    pub fn handle(&mut self, command: ChatCommand) -> Vec<ChatEvent> {
        match command {
            ChatCommand::Send { message } | ChatCommand::Broadcast { message } => {
                self.unread_count += 1;
                self.push_history(message.clone());
                vec![
                    ChatEvent::MessageDisplayed {
                        client_id: MASTER_ID.to_string(),
                        message: message.clone(),
                    },
                    ChatEvent::Notification {
                        client_id: MASTER_ID.to_string(),
                        client_name: message.sender_id().to_string(),
                        play_sound: self.play_sound,
                        show_tray: self.show_tray,
                    },
                ]
            }
            ChatCommand::Clear { .. } => {
                self.history.clear();
                self.unread_count = 0;
                vec![ChatEvent::HistoryCleared {
                    client_id: MASTER_ID.to_string(),
                }]
            }
            ChatCommand::StatusUpdate { client_id, .. } => {
                debug!("Ignoring status update for {}", client_id);
                Vec::new()
            }
        }
    }

    /// Send a message to the teacher console. Blank content is ignored.
    pub fn send(&mut self, content: &str) -> Option<ChatMessage> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }

        let message = ChatMessage::new(self.client_id.as_str(), MASTER_ID, content, Priority::Normal);
        self.push_history(message.clone());
        self.typing_since = None;

        info!("Sending message {} to master", message.id());
        self.transport.deliver(
            Target::Master,
            ChatCommand::Send {
                message: message.clone(),
            }
            .to_feature_message(),
        );
        Some(message)
    }

    /// Track the compose box. The first keystroke reports `Typing`.
    pub fn input_changed(&mut self, has_text: bool) {
        if !has_text {
            return;
        }
        if self.typing_since.is_none() {
            self.report_status(PresenceStatus::Typing);
        }
        self.typing_since = Some(Instant::now());
    }

    /// Whether the typing indicator has been idle for the configured time.
    pub fn typing_expired(&self, now: Instant) -> bool {
        self.typing_since
            .is_some_and(|since| now.duration_since(since) >= self.typing_timeout)
    }

    /// Report `Online` again once typing has stopped.
    pub fn typing_timeout(&mut self) {
        if self.typing_since.take().is_some() {
            self.report_status(PresenceStatus::Online);
        }
    }

    /// The chat window got focus.
    pub fn mark_read(&mut self) {
        self.unread_count = 0;
    }

    fn push_history(&mut self, message: ChatMessage) {
        self.history.push(message);
        if let Some(limit) = self.history_limit {
            if self.history.len() > limit {
                let excess = self.history.len() - limit;
                self.history.drain(..excess);
                let received = self.history.iter().filter(|m| m.is_from_master()).count();
                self.unread_count = self.unread_count.min(received);
            }
        }
    }

    fn report_status(&mut self, status: PresenceStatus) {
        self.transport.deliver(
            Target::Master,
            ChatCommand::StatusUpdate {
                client_id: self.client_id.clone(),
                status,
            }
            .to_feature_message(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::command::CommandCode;
    use crate::chat::transport::Envelope;

    fn client() -> ClientChat<Vec<Envelope>> {
        ClientChat::new("room-12", Vec::new())
    }

    fn from_master(text: &str) -> ChatCommand {
        ChatCommand::Send {
            message: ChatMessage::new(MASTER_ID, "room-12", text, Priority::Normal),
        }
    }

    #[test]
    fn test_receive_counts_unread() {
        let mut chat = client();
        let events = chat.handle(from_master("hello"));
        chat.handle(ChatCommand::Broadcast {
            message: ChatMessage::broadcast("all of you", Priority::Announcement),
        });

        assert_eq!(chat.history().len(), 2);
        assert_eq!(chat.unread_count(), 2);
        assert!(matches!(events[0], ChatEvent::MessageDisplayed { .. }));
        assert!(matches!(events[1], ChatEvent::Notification { .. }));

        chat.mark_read();
        assert_eq!(chat.unread_count(), 0);
    }

    #[test]
    fn test_clear_resets() {
        let mut chat = client();
        chat.handle(from_master("hello"));
        chat.handle(ChatCommand::Clear {
            client_id: "room-12".to_string(),
        });

        assert!(chat.history().is_empty());
        assert_eq!(chat.unread_count(), 0);
    }

    #[test]
    fn test_status_update_ignored() {
        let mut chat = client();
        let events = chat.handle(ChatCommand::StatusUpdate {
            client_id: "room-13".to_string(),
            status: PresenceStatus::Away,
        });
        assert!(events.is_empty());
    }

    #[test]
    fn test_send_goes_to_master() {
        let mut chat = client();
        let message = chat.send(" I am stuck ").unwrap();

        assert_eq!(message.sender_id(), "room-12");
        assert_eq!(message.receiver_id(), MASTER_ID);
        assert_eq!(message.content(), "I am stuck");
        assert_eq!(chat.history().len(), 1);
        assert_eq!(chat.unread_count(), 0);

        let outbox = chat.transport();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].target, Target::Master);
        assert_eq!(outbox[0].message.command, CommandCode::ReceiveMessage as i32);
    }

    #[test]
    fn test_send_blank_ignored() {
        let mut chat = client();
        assert!(chat.send("   ").is_none());
        assert!(chat.transport().is_empty());
    }

    #[test]
    fn test_typing_indicator() {
        let mut chat = client();
        chat.input_changed(true);
        chat.input_changed(true);
        assert!(chat.is_typing());
        assert_eq!(chat.transport().len(), 1);

        chat.typing_timeout();
        assert!(!chat.is_typing());
        assert_eq!(chat.transport().len(), 2);

        // No second Online report.
        chat.typing_timeout();
        assert_eq!(chat.transport().len(), 2);

        let statuses: Vec<_> = chat
            .transport()
            .iter()
            .map(|e| ChatCommand::from_feature_message(&e.message).unwrap())
            .collect();
        assert_eq!(
            statuses,
            vec![
                ChatCommand::StatusUpdate {
                    client_id: "room-12".to_string(),
                    status: PresenceStatus::Typing,
                },
                ChatCommand::StatusUpdate {
                    client_id: "room-12".to_string(),
                    status: PresenceStatus::Online,
                },
            ]
        );
    }

    #[test]
    fn test_typing_expired() {
        let mut config = Config::default();
        config.chat.client_id = "room-12".to_string();
        config.chat.typing_timeout_ms = 50;
        let mut chat = ClientChat::from_config(Vec::<Envelope>::new(), &config);
        assert_eq!(chat.client_id(), "room-12");

        assert!(!chat.typing_expired(Instant::now()));
        chat.input_changed(true);
        assert!(!chat.typing_expired(Instant::now()));
        assert!(chat.typing_expired(Instant::now() + Duration::from_millis(60)));
    }

    #[test]
    fn test_send_stops_typing() {
        let mut chat = client();
        chat.input_changed(true);
        chat.send("done");
        assert!(!chat.is_typing());
    }

    #[test]
    fn test_history_limit_from_config() {
        let mut config = Config::default();
        config.chat.client_id = "room-12".to_string();
        config.chat.max_history = 2;
        let mut chat = ClientChat::from_config(Vec::<Envelope>::new(), &config);

        chat.send("question");
        for text in ["a", "b", "c"] {
            chat.handle(from_master(text));
        }

        let contents: Vec<_> = chat.history().iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["b", "c"]);
        assert_eq!(chat.unread_count(), 2);
    }
}
