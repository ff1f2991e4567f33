//! Client configuration.

use std::time::Duration;

use thiserror::Error;

use crate::line::DEFAULT_MAX_LINE_LEN;

/// Server used when none is configured.
pub const DEFAULT_SERVER: &str = "irc.libera.chat";
/// Plain-text IRC port.
pub const DEFAULT_PORT: u16 = 6667;
/// Reason sent with QUIT when the user gives none.
pub const DEFAULT_QUIT_MESSAGE: &str = "Goodbye!";

/// Configuration errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "serde")]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Connection settings for a [`Session`](crate::session::Session).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientConfig {
    /// Host name or address of the server.
    pub server: String,
    /// TCP port.
    pub port: u16,
    /// Nickname to register with; also used as user name and real name.
    pub nickname: String,
    /// Reason sent with QUIT on disconnect.
    pub quit_message: String,
    /// End the session if the server is silent for this many seconds.
    /// Unset means wait forever.
    pub read_timeout_secs: Option<u64>,
    /// Enable TCP keepalive on the socket.
    pub keepalive: bool,
    /// Capacity of the event channel.
    pub event_buffer: usize,
    /// Longest line accepted from the server, `\r\n` included. A longer
    /// line ends the session.
    pub max_line_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            port: DEFAULT_PORT,
            nickname: String::new(),
            quit_message: DEFAULT_QUIT_MESSAGE.to_string(),
            read_timeout_secs: None,
            keepalive: true,
            event_buffer: 256,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

impl ClientConfig {
    /// Default settings with the given nickname.
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            ..Self::default()
        }
    }

    /// Builder-style server override.
    pub fn with_server(mut self, server: impl Into<String>, port: u16) -> Self {
        self.server = server.into();
        self.port = port;
        self
    }

    /// `server:port`, as dialed.
    pub fn address(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }

    /// Reject settings a connection cannot be made with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.trim().is_empty() {
            return Err(ConfigError::Invalid("server is empty"));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero"));
        }
        if self.nickname.trim().is_empty() {
            return Err(ConfigError::Invalid("nickname is empty"));
        }
        if self.nickname.contains(char::is_whitespace) {
            return Err(ConfigError::Invalid("nickname contains whitespace"));
        }
        if self.event_buffer == 0 {
            return Err(ConfigError::Invalid("event_buffer must be non-zero"));
        }
        if self.max_line_len < 3 {
            return Err(ConfigError::Invalid("max_line_len is too small"));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
