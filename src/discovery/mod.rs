//! Chat-request discovery.
//!
//! A student machine broadcasts a small JSON datagram asking for a chat; the
//! teacher console listens on the same UDP port and turns each valid request
//! into an identity to open a session with. The exchange is best-effort:
//! no acknowledgement, ordering or duplicate suppression.

mod listener;
mod request;
mod requester;

pub use listener::{DiscoveredRequest, DiscoveryListener};
pub use request::{ChatRequest, CHAT_REQUEST_TYPE};
pub use requester::{local_host_name, local_user_name, ChatRequester};
