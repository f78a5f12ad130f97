//! Session registry for the teacher console.
//!
//! Holds exactly one [`ChatSession`] per endpoint identity. Sessions are
//! created lazily on first contact and removed only on request.

use std::collections::BTreeMap;

use tracing::debug;

use super::session::ChatSession;

/// Sort order for client lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSort {
    /// Display name, case-insensitive.
    Name,
    /// Most recent activity first.
    Activity,
    /// Most unread messages first.
    Unread,
}

/// Map from endpoint identity to session.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: BTreeMap<String, ChatSession>,
    history_limit: Option<usize>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry whose sessions keep at most `limit` messages.
    ///
    /// A limit of 0 means unbounded.
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            sessions: BTreeMap::new(),
            history_limit: (limit > 0).then_some(limit),
        }
    }

    /// Get the session for `identity`, creating it if needed.
    ///
    /// An existing session is returned as is; `default_name` only applies to
    /// a newly created one.
    pub fn get_or_create(&mut self, identity: &str, default_name: &str) -> &mut ChatSession {
        let history_limit = self.history_limit;
        self.sessions.entry(identity.to_string()).or_insert_with(|| {
            debug!("Creating chat session for {}", identity);
            let mut session = ChatSession::with_name(identity, default_name);
            session.set_history_limit(history_limit);
            session
        })
    }

    /// Remove a session. Returns false if there was none.
    pub fn remove(&mut self, identity: &str) -> bool {
        self.sessions.remove(identity).is_some()
    }

    pub fn find(&self, identity: &str) -> Option<&ChatSession> {
        self.sessions.get(identity)
    }

    pub fn find_mut(&mut self, identity: &str) -> Option<&mut ChatSession> {
        self.sessions.get_mut(identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.sessions.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Iterate over all sessions in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &ChatSession> {
        self.sessions.values()
    }

    /// Iterate mutably over all sessions in identity order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ChatSession> {
        self.sessions.values_mut()
    }

    /// All sessions in the requested order. Ties keep identity order.
    pub fn sorted(&self, sort: SessionSort) -> Vec<&ChatSession> {
        let mut sessions: Vec<&ChatSession> = self.sessions.values().collect();
        match sort {
            SessionSort::Name => sessions.sort_by_key(|s| s.client_name().to_lowercase()),
            SessionSort::Activity => {
                sessions.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()))
            }
            SessionSort::Unread => sessions.sort_by(|a, b| b.unread_count().cmp(&a.unread_count())),
        }
        sessions
    }

    /// Find the stored identity matching `host`, ignoring case.
    pub fn resolve_identity(&self, host: &str) -> Option<&str> {
        if let Some((identity, _)) = self.sessions.get_key_value(host) {
            return Some(identity);
        }
        self.sessions
            .keys()
            .find(|identity| identity.eq_ignore_ascii_case(host))
            .map(String::as_str)
    }

    /// Total unread messages across all sessions.
    pub fn total_unread(&self) -> usize {
        self.sessions.values().map(ChatSession::unread_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::{ChatMessage, Priority, MASTER_ID};
    use crate::chat::session::PresenceStatus;

    fn inbound(from: &str) -> ChatMessage {
        ChatMessage::new(from, MASTER_ID, "hi", Priority::Normal)
    }

    #[test]
    fn test_registry_new() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_get_or_create_new_session() {
        let mut registry = SessionRegistry::new();
        assert!(registry.find("room-12").is_none());

        let session = registry.get_or_create("room-12", "Room 12");
        assert_eq!(session.client_name(), "Room 12");
        assert_eq!(session.status(), PresenceStatus::Online);
        assert!(session.history().is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_or_create_returns_existing() {
        let mut registry = SessionRegistry::new();
        registry
            .get_or_create("room-12", "Room 12")
            .add_message(inbound("room-12"));

        let session = registry.get_or_create("room-12", "Other Name");
        assert_eq!(session.client_name(), "Room 12");
        assert_eq!(session.history().len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut registry = SessionRegistry::new();
        registry.get_or_create("room-12", "room-12");

        assert!(registry.remove("room-12"));
        assert!(!registry.contains("room-12"));
        assert!(!registry.remove("room-12"));
    }

    #[test]
    fn test_find_mut() {
        let mut registry = SessionRegistry::new();
        registry.get_or_create("room-12", "room-12");

        registry
            .find_mut("room-12")
            .unwrap()
            .set_status(PresenceStatus::Away);
        assert_eq!(
            registry.find("room-12").unwrap().status(),
            PresenceStatus::Away
        );
        assert!(registry.find_mut("room-99").is_none());
    }

    #[test]
    fn test_iteration_order_is_stable() {
        let mut registry = SessionRegistry::new();
        registry.get_or_create("c", "c");
        registry.get_or_create("a", "a");
        registry.get_or_create("b", "b");

        let ids: Vec<_> = registry.iter().map(|s| s.client_id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        registry.find_mut("a").unwrap().add_message(inbound("a"));
        let ids: Vec<_> = registry.iter().map(|s| s.client_id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sorted_by_name_and_unread() {
        let mut registry = SessionRegistry::new();
        registry.get_or_create("10.0.0.2", "bravo");
        registry.get_or_create("10.0.0.1", "Charlie");
        registry.get_or_create("10.0.0.3", "alpha");

        let names: Vec<_> = registry
            .sorted(SessionSort::Name)
            .iter()
            .map(|s| s.client_name())
            .collect();
        assert_eq!(names, vec!["alpha", "bravo", "Charlie"]);

        let bravo = registry.find_mut("10.0.0.2").unwrap();
        bravo.add_message(inbound("10.0.0.2"));
        bravo.add_message(inbound("10.0.0.2"));
        registry
            .find_mut("10.0.0.3")
            .unwrap()
            .add_message(inbound("10.0.0.3"));

        let ids: Vec<_> = registry
            .sorted(SessionSort::Unread)
            .iter()
            .map(|s| s.client_id())
            .collect();
        assert_eq!(ids, vec!["10.0.0.2", "10.0.0.3", "10.0.0.1"]);
        assert_eq!(registry.total_unread(), 3);
    }

    #[test]
    fn test_sorted_by_activity() {
        let mut registry = SessionRegistry::new();
        registry.get_or_create("a", "a");
        registry.get_or_create("b", "b");
        std::thread::sleep(std::time::Duration::from_millis(5));
        registry.find_mut("a").unwrap().set_status(PresenceStatus::Away);

        let first = registry.sorted(SessionSort::Activity)[0].client_id();
        assert_eq!(first, "a");
    }

    #[test]
    fn test_resolve_identity_ignores_case() {
        let mut registry = SessionRegistry::new();
        registry.get_or_create("Room-12", "Room 12");

        assert_eq!(registry.resolve_identity("Room-12"), Some("Room-12"));
        assert_eq!(registry.resolve_identity("room-12"), Some("Room-12"));
        assert_eq!(registry.resolve_identity("ROOM-12"), Some("Room-12"));
        assert_eq!(registry.resolve_identity("room-13"), None);
    }

    #[test]
    fn test_history_limit_applies_to_new_sessions() {
        let mut registry = SessionRegistry::with_history_limit(1);
        let session = registry.get_or_create("room-12", "room-12");
        session.add_message(inbound("room-12"));
        session.add_message(inbound("room-12"));
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.unread_count(), 1);
    }
}
