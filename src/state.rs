//! Sans-IO session state.
//!
//! [`SessionState`] holds everything the client knows about its connection:
//! where it is connected, under which nickname, and which channel it is
//! talking in. It performs no I/O; the session worker is its only writer and
//! publishes snapshots of it to the handle.

use crate::error::ClientError;

/// Lifecycle of a connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionState {
    /// No socket.
    #[default]
    Disconnected,
    /// Dialing the server.
    Connecting,
    /// Socket open and registration sent.
    Connected,
}

/// State of one client session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    server: String,
    port: u16,
    nickname: String,
    current_channel: Option<String>,
    connection: ConnectionState,
}

impl SessionState {
    /// A disconnected session that will register as `nickname`.
    pub fn new(server: impl Into<String>, port: u16, nickname: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            port,
            nickname: nickname.into(),
            current_channel: None,
            connection: ConnectionState::Disconnected,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn current_channel(&self) -> Option<&str> {
        self.current_channel.as_deref()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    /// Fail with [`ClientError::NotConnected`] unless connected.
    pub fn require_connected(&self) -> Result<(), ClientError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ClientError::NotConnected)
        }
    }

    /// The channel plain text goes to.
    pub fn require_channel(&self) -> Result<&str, ClientError> {
        self.require_connected()?;
        self.current_channel().ok_or(ClientError::NoChannel)
    }

    /// `Disconnected → Connecting`.
    pub fn begin_connect(&mut self) {
        self.connection = ConnectionState::Connecting;
    }

    /// `Connecting → Connected`, once registration has been written.
    pub fn mark_connected(&mut self) {
        self.connection = ConnectionState::Connected;
    }

    /// Any state → `Disconnected`. Clears the current channel.
    pub fn mark_disconnected(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.current_channel = None;
    }

    /// Record the channel we just joined, replacing any previous one.
    pub fn set_channel(&mut self, channel: String) {
        self.current_channel = Some(channel);
    }

    /// Forget the current channel, returning it.
    pub fn clear_channel(&mut self) -> Option<String> {
        self.current_channel.take()
    }

    /// Apply a server-confirmed rename.
    ///
    /// Only a rename of our own nickname changes state; returns whether it
    /// did.
    pub fn apply_nick_change(&mut self, old_nick: &str, new_nick: &str) -> bool {
        if old_nick == self.nickname {
            self.nickname = new_nick.to_owned();
            true
        } else {
            false
        }
    }
}
