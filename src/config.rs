//! Configuration module for classchat.

use serde::Deserialize;
use std::net::IpAddr;
use std::path::Path;

use crate::{ChatError, Result};

/// Port the chat-request ping is broadcast on.
pub const DEFAULT_DISCOVERY_PORT: u16 = 29665;

/// Discovery (chat-request ping) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Whether the teacher console listens for chat requests.
    #[serde(default = "default_discovery_enabled")]
    pub enabled: bool,
    /// Address the listener binds to.
    #[serde(default = "default_bind_host")]
    pub bind_host: String,
    /// UDP port shared by listener and requester.
    #[serde(default = "default_discovery_port")]
    pub port: u16,
    /// Destination address for outgoing requests.
    #[serde(default = "default_broadcast_address")]
    pub broadcast_address: String,
    /// Host name announced in requests (empty = detect).
    #[serde(default)]
    pub host_name: String,
}

fn default_discovery_enabled() -> bool {
    true
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_discovery_port() -> u16 {
    DEFAULT_DISCOVERY_PORT
}

fn default_broadcast_address() -> String {
    "255.255.255.255".to_string()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: default_discovery_enabled(),
            bind_host: default_bind_host(),
            port: default_discovery_port(),
            broadcast_address: default_broadcast_address(),
            host_name: String::new(),
        }
    }
}

/// Chat behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Identity of this student machine (empty = host name).
    #[serde(default)]
    pub client_id: String,
    /// Messages kept per session (0 = unbounded).
    #[serde(default)]
    pub max_history: usize,
    /// Idle time before a typing indicator falls back to online.
    #[serde(default = "default_typing_timeout")]
    pub typing_timeout_ms: u64,
    /// Canned replies offered by the teacher console.
    #[serde(default = "default_quick_replies")]
    pub quick_replies: Vec<String>,
}

fn default_typing_timeout() -> u64 {
    2000
}

fn default_quick_replies() -> Vec<String> {
    vec![
        "Please pay attention to the main screen.".to_string(),
        "The lesson is about to start.".to_string(),
        "Do you need any help?".to_string(),
    ]
}

impl ChatConfig {
    /// Identity this student machine chats as.
    pub fn client_identity(&self) -> String {
        if self.client_id.is_empty() {
            crate::discovery::local_host_name()
        } else {
            self.client_id.clone()
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            max_history: 0,
            typing_timeout_ms: default_typing_timeout(),
            quick_replies: default_quick_replies(),
        }
    }
}

/// Notification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Play a sound on incoming messages.
    #[serde(default = "default_sound_enabled")]
    pub sound_enabled: bool,
    /// Show a tray balloon on incoming messages.
    #[serde(default = "default_tray_enabled")]
    pub tray_enabled: bool,
}

fn default_sound_enabled() -> bool {
    true
}

fn default_tray_enabled() -> bool {
    true
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            sound_enabled: default_sound_enabled(),
            tray_enabled: default_tray_enabled(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/classchat.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Discovery configuration.
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Chat configuration.
    #[serde(default)]
    pub chat: ChatConfig,
    /// Notification configuration.
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ChatError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ChatError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `CLASSCHAT_DISCOVERY_PORT`: Override the discovery port
    /// - `CLASSCHAT_LOG_LEVEL`: Override the log level
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("CLASSCHAT_DISCOVERY_PORT") {
            if let Ok(port) = port.trim().parse::<u16>() {
                self.discovery.port = port;
            }
        }

        if let Ok(level) = std::env::var("CLASSCHAT_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - A discovery address is not an IP address
    /// - The typing timeout is zero
    pub fn validate(&self) -> Result<()> {
        if self.discovery.bind_host.parse::<IpAddr>().is_err() {
            return Err(ChatError::Validation(format!(
                "discovery.bind_host is not an IP address: {}",
                self.discovery.bind_host
            )));
        }
        if self.discovery.broadcast_address.parse::<IpAddr>().is_err() {
            return Err(ChatError::Validation(format!(
                "discovery.broadcast_address is not an IP address: {}",
                self.discovery.broadcast_address
            )));
        }
        if self.chat.typing_timeout_ms == 0 {
            return Err(ChatError::Validation(
                "chat.typing_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.discovery.enabled);
        assert_eq!(config.discovery.bind_host, "0.0.0.0");
        assert_eq!(config.discovery.port, 29665);
        assert_eq!(config.discovery.broadcast_address, "255.255.255.255");
        assert!(config.discovery.host_name.is_empty());

        assert!(config.chat.client_id.is_empty());
        assert_eq!(config.chat.max_history, 0);
        assert_eq!(config.chat.typing_timeout_ms, 2000);
        assert_eq!(config.chat.quick_replies.len(), 3);

        assert!(config.notifications.sound_enabled);
        assert!(config.notifications.tray_enabled);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/classchat.log");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[discovery]
enabled = false
bind_host = "127.0.0.1"
port = 30000
broadcast_address = "192.168.1.255"
host_name = "room-12"

[chat]
client_id = "desk-4"
max_history = 500
typing_timeout_ms = 3000
quick_replies = ["Eyes on the board."]

[notifications]
sound_enabled = false
tray_enabled = false

[logging]
level = "debug"
file = "custom/logs/chat.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert!(!config.discovery.enabled);
        assert_eq!(config.discovery.bind_host, "127.0.0.1");
        assert_eq!(config.discovery.port, 30000);
        assert_eq!(config.discovery.broadcast_address, "192.168.1.255");
        assert_eq!(config.discovery.host_name, "room-12");

        assert_eq!(config.chat.client_id, "desk-4");
        assert_eq!(config.chat.max_history, 500);
        assert_eq!(config.chat.typing_timeout_ms, 3000);
        assert_eq!(config.chat.quick_replies, vec!["Eyes on the board."]);

        assert!(!config.notifications.sound_enabled);
        assert!(!config.notifications.tray_enabled);

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "custom/logs/chat.log");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[discovery]
port = 4000
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.discovery.port, 4000);
        assert_eq!(config.discovery.bind_host, "0.0.0.0");
        assert!(config.notifications.sound_enabled);
        assert_eq!(config.chat.typing_timeout_ms, 2000);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.discovery.port, DEFAULT_DISCOVERY_PORT);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        assert!(result.is_err());
        if let Err(ChatError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(ChatError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chat]\nmax_history = 10\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.chat.max_history, 10);
    }

    #[test]
    fn test_apply_env_overrides() {
        let original_port = std::env::var("CLASSCHAT_DISCOVERY_PORT").ok();
        let original_level = std::env::var("CLASSCHAT_LOG_LEVEL").ok();

        std::env::set_var("CLASSCHAT_DISCOVERY_PORT", "31000");
        std::env::set_var("CLASSCHAT_LOG_LEVEL", "trace");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.discovery.port, 31000);
        assert_eq!(config.logging.level, "trace");

        // Unparseable port is ignored
        std::env::set_var("CLASSCHAT_DISCOVERY_PORT", "not-a-port");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.discovery.port, DEFAULT_DISCOVERY_PORT);

        match original_port {
            Some(val) => std::env::set_var("CLASSCHAT_DISCOVERY_PORT", val),
            None => std::env::remove_var("CLASSCHAT_DISCOVERY_PORT"),
        }
        match original_level {
            Some(val) => std::env::set_var("CLASSCHAT_LOG_LEVEL", val),
            None => std::env::remove_var("CLASSCHAT_LOG_LEVEL"),
        }
    }

    #[test]
    fn test_validate_default() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_broadcast_address() {
        let mut config = Config::default();
        config.discovery.broadcast_address = "everyone".to_string();

        let result = config.validate();
        if let Err(ChatError::Validation(msg)) = result {
            assert!(msg.contains("broadcast_address"));
        } else {
            panic!("Expected Validation error");
        }
    }

    #[test]
    fn test_validate_bad_bind_host() {
        let mut config = Config::default();
        config.discovery.bind_host = "localhost".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_typing_timeout() {
        let mut config = Config::default();
        config.chat.typing_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_client_identity_prefers_configured_id() {
        let mut config = ChatConfig::default();
        config.client_id = "desk-4".to_string();
        assert_eq!(config.client_identity(), "desk-4");
    }
}
