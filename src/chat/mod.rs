//! Chat module for classchat.
//!
//! This module provides the chat core shared by the teacher console and the
//! student machines:
//! - Messages with priority and delivery status
//! - Per-client sessions and the registry that owns them
//! - Typed chat commands and their feature-message envelope
//! - Routers that apply commands and turn user actions into commands

mod client;
mod command;
mod message;
mod registry;
mod router;
mod session;
mod transport;

pub use client::ClientChat;
pub use command::{args, ChatCommand, CommandCode, FeatureMessage, CHAT_FEATURE_UID};
pub use message::{
    ChatMessage, DeliveryStatus, Priority, BROADCAST_RECEIVER, LOCAL_BROADCAST_RECEIVER,
    MASTER_ID,
};
pub use registry::{SessionRegistry, SessionSort};
pub use router::{ChatEvent, ChatRouter};
pub use session::{ChatSession, PresenceStatus};
pub use transport::{ChannelTransport, Envelope, Target, Transport};
