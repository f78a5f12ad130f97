//! classchat - classroom chat core
//!
//! Chat sessions for a teacher console, the matching student side, and a UDP
//! ping that lets a student ask the console for a chat.

pub mod chat;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;

pub use chat::{
    ChannelTransport, ChatCommand, ChatEvent, ChatMessage, ChatRouter, ChatSession, ClientChat,
    DeliveryStatus, Envelope, FeatureMessage, PresenceStatus, Priority, SessionRegistry, Target,
    Transport, MASTER_ID,
};
pub use config::Config;
pub use discovery::{ChatRequest, ChatRequester, DiscoveredRequest, DiscoveryListener};
pub use error::{ChatError, Result};
