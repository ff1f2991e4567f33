//! Error types for the IRC client engine.
//!
//! Parsing never fails: malformed lines degrade to
//! [`ClientEvent::Unrecognized`](crate::event::ClientEvent::Unrecognized).
//! Everything here concerns the connection and the operator's requests.

use thiserror::Error;

/// Convenience type alias for Results using [`ClientError`].
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Errors reported by a [`Session`](crate::session::Session).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Establishing the connection failed (resolution, refused, timeout).
    #[error("failed to connect to {addr}: {source}")]
    Connection {
        /// The `host:port` that was dialed.
        addr: String,
        /// The underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// A read or write failed mid-session.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The action requires a live connection.
    #[error("not connected to a server")]
    NotConnected,

    /// Plain text was submitted while no channel is joined.
    #[error("you must join a channel first")]
    NoChannel,

    /// `connect` was called while a connection is already active.
    #[error("already connected to a server")]
    AlreadyConnected,

    /// A join was requested without a channel name.
    #[error("channel name is empty")]
    EmptyChannel,

    /// The session's configuration cannot be used to connect.
    #[error("{0}")]
    InvalidConfig(String),
}

// `io::Error` is not `Clone`; keep the kind and message.
fn clone_io(err: &std::io::Error) -> std::io::Error {
    std::io::Error::new(err.kind(), err.to_string())
}

impl Clone for ClientError {
    fn clone(&self) -> Self {
        match self {
            ClientError::Connection { addr, source } => ClientError::Connection {
                addr: addr.clone(),
                source: clone_io(source),
            },
            ClientError::Transport(err) => ClientError::Transport(clone_io(err)),
            ClientError::NotConnected => ClientError::NotConnected,
            ClientError::NoChannel => ClientError::NoChannel,
            ClientError::AlreadyConnected => ClientError::AlreadyConnected,
            ClientError::EmptyChannel => ClientError::EmptyChannel,
            ClientError::InvalidConfig(msg) => ClientError::InvalidConfig(msg.clone()),
        }
    }
}

impl ClientError {
    /// Whether this error means "nothing was sent because there is nowhere
    /// to send it".
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::NotConnected | Self::NoChannel)
    }

    /// Whether this error ended (or prevented) a connection.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Transport(_))
    }
}
