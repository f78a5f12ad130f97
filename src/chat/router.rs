//! Command routing for the teacher console.
//!
//! [`ChatRouter`] owns the session registry. Inbound commands from the
//! transport and local user actions both go through it; each call returns the
//! [`ChatEvent`]s the UI layer should render.

use tracing::{debug, info, warn};

use super::command::{ChatCommand, FeatureMessage};
use super::message::{ChatMessage, DeliveryStatus, Priority, LOCAL_BROADCAST_RECEIVER, MASTER_ID};
use super::registry::SessionRegistry;
use super::session::{ChatSession, PresenceStatus};
use super::transport::{Target, Transport};
use crate::config::{Config, NotificationConfig};
use crate::{ChatError, Result};

/// Something the UI should show.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Append a line to the transcript of `client_id`.
    MessageDisplayed {
        client_id: String,
        message: ChatMessage,
    },
    /// Tell the user a message arrived.
    Notification {
        client_id: String,
        client_name: String,
        play_sound: bool,
        show_tray: bool,
    },
    /// The transcript of `client_id` was emptied. Empty id means every transcript.
    HistoryCleared { client_id: String },
    /// Presence of `client_id` changed.
    StatusChanged {
        client_id: String,
        status: PresenceStatus,
    },
    /// `client_id` is now the displayed session.
    SessionFocused { client_id: String },
    /// Names, unread counts or membership of the client list changed.
    SessionsChanged,
}

/// Command router of the teacher console.
pub struct ChatRouter<T> {
    registry: SessionRegistry,
    transport: T,
    current_client: Option<String>,
    notifications: NotificationConfig,
    quick_replies: Vec<String>,
}

impl<T: Transport> ChatRouter<T> {
    /// Create a router with default settings.
    pub fn new(transport: T) -> Self {
        Self {
            registry: SessionRegistry::new(),
            transport,
            current_client: None,
            notifications: NotificationConfig::default(),
            quick_replies: Vec::new(),
        }
    }

    /// Create a router using the chat and notification settings of `config`.
    pub fn from_config(transport: T, config: &Config) -> Self {
        Self {
            registry: SessionRegistry::with_history_limit(config.chat.max_history),
            transport,
            current_client: None,
            notifications: config.notifications.clone(),
            quick_replies: config.chat.quick_replies.clone(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SessionRegistry {
        &mut self.registry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Identity of the displayed session, if any.
    pub fn current_client(&self) -> Option<&str> {
        self.current_client.as_deref()
    }

    /// The displayed session, if any.
    pub fn current_session(&self) -> Option<&ChatSession> {
        self.current_client
            .as_deref()
            .and_then(|id| self.registry.find(id))
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.notifications.sound_enabled = enabled;
    }

    /// Decode and apply a feature message from the transport.
    ///
    /// Envelopes that are not chat commands are ignored.
    pub fn handle_feature_message(&mut self, message: &FeatureMessage) -> Vec<ChatEvent> {
        match ChatCommand::from_feature_message(message) {
            Ok(command) => self.handle(command),
            Err(e) => {
                debug!("Ignoring feature message: {}", e);
                Vec::new()
            }
        }
    }

    /// Apply an inbound command.
    ///
    /// Unknown identities get a session on the spot; no command fails.
    pub fn handle(&mut self, command: ChatCommand) -> Vec<ChatEvent> {
        debug!("Handling inbound {} command", command.name());
        match command {
            ChatCommand::Send { message } | ChatCommand::Broadcast { message } => {
                self.receive_message(message)
            }
            ChatCommand::Clear { client_id } => self.clear_local(&client_id),
            ChatCommand::StatusUpdate { client_id, status } => {
                self.update_client_status(&client_id, status)
            }
        }
    }

    /// Record a presence change. Updates without an identity are dropped.
    pub fn update_client_status(&mut self, client_id: &str, status: PresenceStatus) -> Vec<ChatEvent> {
        if client_id.is_empty() {
            debug!("Dropping status update without a client id");
            return Vec::new();
        }
        self.registry
            .get_or_create(client_id, client_id)
            .set_status(status);
        vec![
            ChatEvent::StatusChanged {
                client_id: client_id.to_string(),
                status,
            },
            ChatEvent::SessionsChanged,
        ]
    }

    fn receive_message(&mut self, message: ChatMessage) -> Vec<ChatEvent> {
        let client_id = message.sender_id().to_string();
        if client_id.is_empty() {
            warn!("Dropping message {} without a sender", message.id());
            return Vec::new();
        }
        let mut events = Vec::new();

        if self.current_client.is_none() {
            self.current_client = Some(client_id.clone());
            events.push(ChatEvent::SessionFocused {
                client_id: client_id.clone(),
            });
        }
        let displayed = self.current_client.as_deref() == Some(client_id.as_str());

        let session = self.registry.get_or_create(&client_id, &client_id);
        session.add_message(message.clone());
        if displayed {
            session.mark_all_as_read();
            events.push(ChatEvent::MessageDisplayed {
                client_id: client_id.clone(),
                message,
            });
        }

        events.push(ChatEvent::Notification {
            client_id,
            client_name: session.client_name().to_string(),
            play_sound: self.notifications.sound_enabled,
            show_tray: self.notifications.tray_enabled,
        });
        events.push(ChatEvent::SessionsChanged);
        events
    }

    /// Send a message to the displayed client.
    ///
    /// Fails with [`ChatError::NoTargetSelected`] when no client is displayed;
    /// nothing is sent in that case. Blank content is ignored.
    pub fn send_message(&mut self, content: &str, priority: Priority) -> Result<Vec<ChatEvent>> {
        let client_id = self
            .current_client
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or(ChatError::NoTargetSelected)?;

        let content = content.trim();
        if content.is_empty() {
            return Ok(Vec::new());
        }

        let message = ChatMessage::new(MASTER_ID, client_id.as_str(), content, priority);
        let session = self.registry.get_or_create(&client_id, &client_id);
        session.add_message(message.clone());
        session.mark_all_as_read();

        info!("Sending message {} to {}", message.id(), client_id);
        self.transport.deliver(
            Target::Client(client_id.clone()),
            ChatCommand::Send {
                message: message.clone(),
            }
            .to_feature_message(),
        );

        Ok(vec![
            ChatEvent::MessageDisplayed { client_id, message },
            ChatEvent::SessionsChanged,
        ])
    }

    /// Canned replies offered to the user.
    pub fn quick_replies(&self) -> &[String] {
        &self.quick_replies
    }

    /// Send the quick reply at `index` to the displayed client.
    pub fn send_quick_reply(&mut self, index: usize, priority: Priority) -> Result<Vec<ChatEvent>> {
        let content = self
            .quick_replies
            .get(index)
            .cloned()
            .ok_or_else(|| ChatError::NotFound(format!("quick reply {index}")))?;
        self.send_message(&content, priority)
    }

    /// Send a message to every client.
    ///
    /// The message is recorded in every known session and dispatched once to
    /// all endpoints. Blank content is ignored.
    pub fn broadcast(&mut self, content: &str, priority: Priority) -> Vec<ChatEvent> {
        let content = content.trim();
        if content.is_empty() {
            return Vec::new();
        }

        let message = ChatMessage::broadcast(content, priority);
        let local = message.with_receiver(LOCAL_BROADCAST_RECEIVER);
        for session in self.registry.iter_mut() {
            session.add_message(local.clone());
        }

        info!(
            "Broadcasting message {} to {} sessions",
            message.id(),
            self.registry.len()
        );
        self.transport
            .deliver(Target::All, ChatCommand::Broadcast { message }.to_feature_message());

        let mut events = Vec::new();
        if let Some(client_id) = self.current_client.clone() {
            events.push(ChatEvent::MessageDisplayed {
                client_id,
                message: local,
            });
        }
        events.push(ChatEvent::SessionsChanged);
        events
    }

    /// Clear the chat with `client_id` here and on the client.
    ///
    /// An empty id clears every session and is sent to every client.
    pub fn clear(&mut self, client_id: &str) -> Vec<ChatEvent> {
        let events = self.clear_local(client_id);

        let target = if client_id.is_empty() {
            Target::All
        } else {
            Target::Client(client_id.to_string())
        };
        info!("Clearing chat history ({})", target);
        self.transport.deliver(
            target,
            ChatCommand::Clear {
                client_id: client_id.to_string(),
            }
            .to_feature_message(),
        );
        events
    }

    fn clear_local(&mut self, client_id: &str) -> Vec<ChatEvent> {
        if client_id.is_empty() {
            for session in self.registry.iter_mut() {
                session.clear_history();
            }
        } else {
            self.registry
                .get_or_create(client_id, client_id)
                .clear_history();
        }
        vec![
            ChatEvent::HistoryCleared {
                client_id: client_id.to_string(),
            },
            ChatEvent::SessionsChanged,
        ]
    }

    /// Register a client, or rename a known one.
    pub fn add_client(&mut self, client_id: &str, client_name: &str) -> Vec<ChatEvent> {
        if client_id.is_empty() {
            return Vec::new();
        }
        self.registry
            .get_or_create(client_id, client_name)
            .set_client_name(client_name);
        vec![ChatEvent::SessionsChanged]
    }

    /// Forget a client and its history.
    pub fn remove_client(&mut self, client_id: &str) -> Vec<ChatEvent> {
        if !self.registry.remove(client_id) {
            return Vec::new();
        }

        let mut events = Vec::new();
        if self.current_client.as_deref() == Some(client_id) {
            self.current_client = None;
            events.push(ChatEvent::HistoryCleared {
                client_id: client_id.to_string(),
            });
        }
        events.push(ChatEvent::SessionsChanged);
        events
    }

    /// Display the session of a known client and mark it read.
    pub fn select_client(&mut self, client_id: &str) -> Result<Vec<ChatEvent>> {
        let session = self
            .registry
            .find_mut(client_id)
            .ok_or_else(|| ChatError::NotFound(format!("client {client_id}")))?;
        session.mark_all_as_read();

        self.current_client = Some(client_id.to_string());
        Ok(vec![
            ChatEvent::SessionFocused {
                client_id: client_id.to_string(),
            },
            ChatEvent::SessionsChanged,
        ])
    }

    /// Open or focus the session for a host that asked to chat.
    ///
    /// The host is matched against known identities ignoring case; an unknown
    /// host gets a new session. Repeated requests just refocus.
    pub fn focus_client(&mut self, host: &str) -> Vec<ChatEvent> {
        if host.is_empty() {
            return Vec::new();
        }

        let client_id = self
            .registry
            .resolve_identity(host)
            .unwrap_or(host)
            .to_string();
        self.registry
            .get_or_create(&client_id, &client_id)
            .mark_all_as_read();

        info!("Focusing chat session {}", client_id);
        self.current_client = Some(client_id.clone());
        vec![
            ChatEvent::SessionFocused { client_id },
            ChatEvent::SessionsChanged,
        ]
    }

    /// Set the delivery status of a message in whichever session holds it.
    ///
    /// Returns false if no session has a message with that id.
    pub fn update_message_status(&mut self, message_id: &str, status: DeliveryStatus) -> bool {
        let mut updated = false;
        for session in self.registry.iter_mut() {
            updated |= session.update_message_status(message_id, status);
        }
        updated
    }
}
