//! Chat commands and the feature-message envelope they travel in.
//!
//! Inside the crate every command is a [`ChatCommand`] variant with typed
//! fields. The integer command codes and the loose argument map only exist in
//! [`FeatureMessage`], the form handed to the host transport.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::message::{ChatMessage, Priority, MASTER_ID};
use super::session::PresenceStatus;
use crate::{ChatError, Result};

/// Feature uid the chat commands are registered under.
pub const CHAT_FEATURE_UID: &str = "a1b2c3d4-e5f6-7890-abcd-ef1234567890";

/// Argument keys.
pub mod args {
    pub const MESSAGE: &str = "message";
    pub const CONTENT: &str = "content";
    pub const PRIORITY: &str = "priority";
    pub const CLIENT_ID: &str = "clientId";
    pub const STATUS: &str = "status";
}

/// Command codes of the chat feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCode {
    OpenChatWindow = 0,
    SendMessage = 1,
    ReceiveMessage = 2,
    UpdateStatus = 3,
    ClearChat = 4,
    GlobalBroadcast = 5,
}

impl CommandCode {
    /// Decode a raw command code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(CommandCode::OpenChatWindow),
            1 => Some(CommandCode::SendMessage),
            2 => Some(CommandCode::ReceiveMessage),
            3 => Some(CommandCode::UpdateStatus),
            4 => Some(CommandCode::ClearChat),
            5 => Some(CommandCode::GlobalBroadcast),
            _ => None,
        }
    }
}

/// Addressed command envelope carried by the host transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureMessage {
    pub feature_uid: String,
    pub command: i32,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl FeatureMessage {
    /// Create an envelope for the chat feature.
    pub fn new(command: CommandCode) -> Self {
        Self {
            feature_uid: CHAT_FEATURE_UID.to_string(),
            command: command as i32,
            arguments: Map::new(),
        }
    }

    /// Add a named argument.
    pub fn with_argument(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.to_string(), value.into());
        self
    }

    pub fn argument(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }

    /// Whether this envelope belongs to the chat feature.
    pub fn is_chat(&self) -> bool {
        self.feature_uid == CHAT_FEATURE_UID
    }

    fn string_argument(&self, key: &str) -> String {
        self.argument(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn int_argument(&self, key: &str) -> i64 {
        self.argument(key).and_then(Value::as_i64).unwrap_or(0)
    }
}

/// A chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// One message addressed to one endpoint.
    Send { message: ChatMessage },
    /// One message from the teacher console to every endpoint.
    Broadcast { message: ChatMessage },
    /// Drop the chat history of one endpoint, or of all when `client_id` is empty.
    Clear { client_id: String },
    /// Presence change reported by an endpoint.
    StatusUpdate {
        client_id: String,
        status: PresenceStatus,
    },
}

impl ChatCommand {
    /// Command name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ChatCommand::Send { .. } => "send",
            ChatCommand::Broadcast { .. } => "broadcast",
            ChatCommand::Clear { .. } => "clear",
            ChatCommand::StatusUpdate { .. } => "status_update",
        }
    }

    /// Encode into a feature message.
    pub fn to_feature_message(&self) -> FeatureMessage {
        match self {
            ChatCommand::Send { message } => {
                let code = if message.sender_id() == MASTER_ID {
                    CommandCode::SendMessage
                } else {
                    CommandCode::ReceiveMessage
                };
                FeatureMessage::new(code).with_argument(args::MESSAGE, message.to_json())
            }
            ChatCommand::Broadcast { message } => FeatureMessage::new(CommandCode::GlobalBroadcast)
                .with_argument(args::MESSAGE, message.to_json()),
            ChatCommand::Clear { client_id } => FeatureMessage::new(CommandCode::ClearChat)
                .with_argument(args::CLIENT_ID, client_id.as_str()),
            ChatCommand::StatusUpdate { client_id, status } => {
                FeatureMessage::new(CommandCode::UpdateStatus)
                    .with_argument(args::CLIENT_ID, client_id.as_str())
                    .with_argument(args::STATUS, status.code())
            }
        }
    }

    /// Decode a feature message.
    ///
    /// Missing arguments take their zero values. Envelopes of another feature
    /// and codes that carry no chat command are rejected.
    pub fn from_feature_message(message: &FeatureMessage) -> Result<Self> {
        if !message.is_chat() {
            return Err(ChatError::Protocol(format!(
                "foreign feature uid {}",
                message.feature_uid
            )));
        }

        let code = CommandCode::from_code(message.command).ok_or_else(|| {
            ChatError::Protocol(format!("unknown command code {}", message.command))
        })?;

        match code {
            CommandCode::SendMessage | CommandCode::ReceiveMessage => Ok(ChatCommand::Send {
                message: decode_message(message),
            }),
            CommandCode::GlobalBroadcast => {
                let chat_message = if message.argument(args::MESSAGE).is_some() {
                    decode_message(message)
                } else {
                    ChatMessage::broadcast(
                        message.string_argument(args::CONTENT),
                        Priority::from_code(message.int_argument(args::PRIORITY)),
                    )
                };
                Ok(ChatCommand::Broadcast {
                    message: chat_message,
                })
            }
            CommandCode::ClearChat => Ok(ChatCommand::Clear {
                client_id: message.string_argument(args::CLIENT_ID),
            }),
            CommandCode::UpdateStatus => Ok(ChatCommand::StatusUpdate {
                client_id: message.string_argument(args::CLIENT_ID),
                status: PresenceStatus::from_code(message.int_argument(args::STATUS)),
            }),
            CommandCode::OpenChatWindow => Err(ChatError::Protocol(
                "open-window carries no chat command".to_string(),
            )),
        }
    }
}

fn decode_message(message: &FeatureMessage) -> ChatMessage {
    match message.argument(args::MESSAGE) {
        Some(record) => ChatMessage::from_json(record),
        None => ChatMessage::from_json(&Value::Null),
    }
}
