//! Outgoing command encoding.
//!
//! Every function here is pure: it maps an intent to an [`OutgoingCommand`]
//! and never touches a socket. The session writes the result through
//! [`LineCodec`](crate::line::LineCodec), which appends `\r\n`.
//!
//! # Example
//!
//! ```
//! use slirc_client::encode::{self, IrcEncode};
//!
//! let cmd = encode::privmsg("#rust", "Hello!");
//! assert_eq!(cmd.to_bytes(), b"PRIVMSG #rust :Hello!\r\n");
//!
//! assert_eq!(encode::join("rust").as_str(), "JOIN #rust");
//! ```

use std::fmt;
use std::io::{self, Write};

/// A trait for writing IRC wire data directly to a byte sink.
pub trait IrcEncode {
    /// Encode this value to the given writer, including the terminator.
    ///
    /// Returns the number of bytes written on success.
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<usize>;

    /// Encode this value to a new `Vec<u8>`.
    #[must_use]
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(512);
        let _ = self.encode(&mut buf);
        buf
    }
}

/// A single command line ready to be written, without its terminator.
///
/// Construction cuts the text at the first CR, LF or NUL, so user-supplied
/// text can never put a second command on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingCommand(String);

impl OutgoingCommand {
    /// Wrap a line of text, sanitizing it.
    pub fn new(line: impl Into<String>) -> Self {
        let mut line = line.into();
        if let Some(end) = line.find(['\r', '\n', '\0']) {
            line.truncate(end);
        }
        Self(line)
    }

    /// The command line without `\r\n`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The command name (first token), e.g. `PRIVMSG`.
    pub fn name(&self) -> &str {
        self.0.split(' ').next().unwrap_or("")
    }

    /// Whether sanitizing left nothing to send.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl IrcEncode for OutgoingCommand {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        w.write_all(self.0.as_bytes())?;
        w.write_all(b"\r\n")?;
        Ok(self.0.len() + 2)
    }
}

impl fmt::Display for OutgoingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Prefix `#` onto a channel name that lacks it.
pub fn normalize_channel(channel: &str) -> String {
    if channel.starts_with('#') {
        channel.to_owned()
    } else {
        format!("#{}", channel)
    }
}

/// The two registration lines, in the order they must be sent.
pub fn registration(nickname: &str) -> [OutgoingCommand; 2] {
    [
        nick(nickname),
        OutgoingCommand::new(format!("USER {0} 0 * :{0}", nickname)),
    ]
}

/// `JOIN <channel>`, adding `#` when missing.
pub fn join(channel: &str) -> OutgoingCommand {
    OutgoingCommand::new(format!("JOIN {}", normalize_channel(channel)))
}

/// `PART <channel>`.
pub fn part(channel: &str) -> OutgoingCommand {
    OutgoingCommand::new(format!("PART {}", channel))
}

/// `PRIVMSG <target> :<text>`.
pub fn privmsg(target: &str, text: &str) -> OutgoingCommand {
    OutgoingCommand::new(format!("PRIVMSG {} :{}", target, text))
}

/// `NICK <nickname>`.
pub fn nick(nickname: &str) -> OutgoingCommand {
    OutgoingCommand::new(format!("NICK {}", nickname))
}

/// `QUIT :<reason>`.
pub fn quit(reason: &str) -> OutgoingCommand {
    OutgoingCommand::new(format!("QUIT :{}", reason))
}

/// `PONG <token>`, echoing the PING parameters verbatim.
pub fn pong(token: &str) -> OutgoingCommand {
    OutgoingCommand::new(format!("PONG {}", token))
}

/// A raw line passed through unchanged.
pub fn raw(text: &str) -> OutgoingCommand {
    OutgoingCommand::new(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_order() {
        let [nick, user] = registration("alice");
        assert_eq!(nick.as_str(), "NICK alice");
        assert_eq!(user.as_str(), "USER alice 0 * :alice");
    }

    #[test]
    fn test_join_adds_hash_once() {
        assert_eq!(join("room").as_str(), "JOIN #room");
        assert_eq!(join("#room").as_str(), "JOIN #room");
        assert_eq!(normalize_channel("#a"), "#a");
        assert_eq!(normalize_channel("a"), "#a");
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(part("#room").as_str(), "PART #room");
        assert_eq!(privmsg("#x", "msg with spaces").as_str(), "PRIVMSG #x :msg with spaces");
        assert_eq!(nick("bobby").as_str(), "NICK bobby");
        assert_eq!(quit("Goodbye!").as_str(), "QUIT :Goodbye!");
        assert_eq!(pong(":abc123").as_str(), "PONG :abc123");
        assert_eq!(raw("WHOIS alice").as_str(), "WHOIS alice");
    }

    #[test]
    fn test_encode_appends_crlf() {
        let cmd = privmsg("#channel", "Hello world!");
        assert_eq!(cmd.to_bytes(), b"PRIVMSG #channel :Hello world!\r\n");

        let mut buf = Vec::new();
        let written = cmd.encode(&mut buf).unwrap();
        assert_eq!(written, buf.len());
    }

    #[test]
    fn test_embedded_line_break_is_cut() {
        let cmd = privmsg("#x", "hi\r\nQUIT :pwned");
        assert_eq!(cmd.as_str(), "PRIVMSG #x :hi");

        let cmd = raw("JOIN #a\nJOIN #b");
        assert_eq!(cmd.as_str(), "JOIN #a");

        assert!(raw("\r\nNICK x").is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(privmsg("#x", "y").name(), "PRIVMSG");
        assert_eq!(raw("").name(), "");
    }
}
