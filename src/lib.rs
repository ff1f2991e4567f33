//! # slirc-client
//!
//! The protocol engine of a small IRC client: it connects to a server,
//! registers, turns the incoming byte stream into typed events and turns
//! operator input into wire commands. Rendering and input editing are left
//! to the application, which talks to the engine through a [`Session`] and
//! a channel of [`SessionEvent`]s.
//!
//! ## Features
//!
//! - `\r\n` line framing that survives arbitrary read boundaries and bad UTF-8
//! - A forgiving message parser that never fails
//! - Event dispatch for chat, membership, nick changes and common numerics
//! - Automatic `PONG` replies
//! - Slash-command parsing (`/join`, `/part`, `/msg`, `/nick`, `/quit`, raw)
//! - Optional Tokio integration for the connection itself
//!
//! ## Parsing and dispatching without a socket
//!
//! ```rust
//! use slirc_client::{dispatch, ClientEvent, Dispatch, LineFramer, ParsedMessage, SessionState};
//!
//! let mut framer = LineFramer::new();
//! let mut state = SessionState::new("irc.example.com", 6667, "me");
//!
//! for line in framer.feed(b":alice!u@h PRIVMSG #room :hello there\r\nPING :abc\r\n") {
//!     match dispatch(&ParsedMessage::parse(line.as_str()), &mut state) {
//!         Dispatch::Event(ClientEvent::ChatMessage { nick, text, .. }) => {
//!             assert_eq!((nick.as_str(), text.as_str()), ("alice", "hello there"));
//!         }
//!         Dispatch::Reply(pong) => assert_eq!(pong.as_str(), "PONG :abc"),
//!         other => panic!("unexpected {:?}", other),
//!     }
//! }
//! ```

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod command;
pub mod config;
pub mod encode;
pub mod error;
pub mod event;
pub mod line;
pub mod message;
#[cfg(feature = "tokio")]
pub mod session;
pub mod state;

pub use self::command::UserCommand;
pub use self::config::{ClientConfig, ConfigError};
pub use self::encode::{IrcEncode, OutgoingCommand};
pub use self::error::ClientError;
pub use self::event::{dispatch, ClientEvent, Dispatch};
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
pub use self::line::{LineFramer, RawLine};
pub use self::message::ParsedMessage;
#[cfg(feature = "tokio")]
pub use self::session::{DisconnectReason, Session, SessionEvent};
pub use self::state::{ConnectionState, SessionState};
