//! Mapping parsed server messages to client events.
//!
//! [`dispatch`] is the only producer of [`ClientEvent`]s. Each message yields
//! exactly one [`Dispatch`]: either an event for the presentation layer or,
//! for `PING`, a reply the session writes back immediately.

use tracing::debug;

use crate::encode::{self, OutgoingCommand};
use crate::message::{strip_colon, ParsedMessage};
use crate::state::SessionState;

/// Numerics shown to the user as plain server text.
const SERVER_NOTICE_NUMERICS: &[&str] = &[
    "001", "002", "003", "004", "005", "251", "252", "253", "254", "255", "265", "266", "372",
    "375", "376",
];

/// A semantic event derived from one server line.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClientEvent {
    /// A PRIVMSG to a channel or to us.
    ChatMessage {
        nick: String,
        target: String,
        text: String,
    },
    /// Someone (possibly us) joined a channel.
    Joined { nick: String, channel: String },
    /// Someone (possibly us) left a channel.
    Parted { nick: String, channel: String },
    /// Someone disconnected from the network.
    Quit { nick: String, reason: String },
    /// Someone (possibly us) changed nickname.
    NickChanged { old_nick: String, new_nick: String },
    /// Welcome, MOTD and user-count numerics.
    ServerNotice { text: String },
    /// RPL_TOPIC.
    Topic { channel: String, text: String },
    /// RPL_NAMREPLY.
    NamesList { names: Vec<String> },
    /// ERR_NICKNAMEINUSE.
    NicknameInUse,
    /// A keep-alive PING from the server.
    Ping { token: String },
    /// Anything else, as received.
    Unrecognized { raw: String },
}

/// The outcome of dispatching one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Deliver this event to the presentation layer.
    Event(ClientEvent),
    /// Write this command back to the server; nothing is shown.
    Reply(OutgoingCommand),
}

impl Dispatch {
    /// The event, if this is one.
    pub fn event(self) -> Option<ClientEvent> {
        match self {
            Dispatch::Event(event) => Some(event),
            Dispatch::Reply(_) => None,
        }
    }
}

/// Translate a parsed message into an event or an automatic reply.
///
/// A `NICK` whose sender is our current nickname renames us in `state`.
///
/// # Example
///
/// ```
/// use slirc_client::event::{dispatch, ClientEvent, Dispatch};
/// use slirc_client::message::ParsedMessage;
/// use slirc_client::state::SessionState;
///
/// let mut state = SessionState::new("irc.example.com", 6667, "me");
/// let msg = ParsedMessage::parse(":alice!u@h PRIVMSG #room :hello there");
/// assert_eq!(
///     dispatch(&msg, &mut state),
///     Dispatch::Event(ClientEvent::ChatMessage {
///         nick: "alice".to_string(),
///         target: "#room".to_string(),
///         text: "hello there".to_string(),
///     })
/// );
/// ```
pub fn dispatch(msg: &ParsedMessage, state: &mut SessionState) -> Dispatch {
    let nick = msg.nick();
    let event = match (msg.command.as_str(), msg.params.as_slice()) {
        ("PING", [_, ..]) => return Dispatch::Reply(encode::pong(&msg.params.join(" "))),
        ("PRIVMSG", [target, text, ..]) => ClientEvent::ChatMessage {
            nick: nick.to_owned(),
            target: target.clone(),
            text: strip_colon(text).to_owned(),
        },
        ("JOIN", [channel, ..]) => ClientEvent::Joined {
            nick: nick.to_owned(),
            channel: strip_colon(channel).to_owned(),
        },
        ("PART", [channel, ..]) => ClientEvent::Parted {
            nick: nick.to_owned(),
            channel: strip_colon(channel).to_owned(),
        },
        ("QUIT", params) => ClientEvent::Quit {
            nick: nick.to_owned(),
            reason: strip_colon(&params.join(" ")).to_owned(),
        },
        ("NICK", [new_nick, ..]) => {
            let new_nick = strip_colon(new_nick);
            if state.apply_nick_change(nick, new_nick) {
                debug!(nick = new_nick, "own nickname changed");
            }
            ClientEvent::NickChanged {
                old_nick: nick.to_owned(),
                new_nick: new_nick.to_owned(),
            }
        }
        (code, params) if SERVER_NOTICE_NUMERICS.contains(&code) => ClientEvent::ServerNotice {
            text: strip_colon(&params.get(1..).unwrap_or_default().join(" ")).to_owned(),
        },
        ("332", [first, rest, ..]) => {
            let (channel, text) = split_reply(first, rest);
            ClientEvent::Topic {
                channel: channel.to_owned(),
                text: text.to_owned(),
            }
        }
        ("353", [first, rest, ..]) => {
            let (_, names) = split_reply(first, rest);
            ClientEvent::NamesList {
                names: names.split_whitespace().map(str::to_owned).collect(),
            }
        }
        ("433", _) => ClientEvent::NicknameInUse,
        (command, params) => {
            if is_known(command) {
                debug!(
                    command,
                    params = params.len(),
                    "protocol anomaly: too few parameters"
                );
            }
            ClientEvent::Unrecognized {
                raw: msg.to_string(),
            }
        }
    };
    Dispatch::Event(event)
}

/// Commands that have a dispatch rule, for anomaly logging.
fn is_known(command: &str) -> bool {
    matches!(
        command,
        "PING" | "PRIVMSG" | "JOIN" | "PART" | "NICK" | "332" | "353"
    )
}

fn is_channel(name: &str) -> bool {
    name.starts_with(['#', '&'])
}

/// Find the channel and trailing text of a 332/353 reply.
///
/// Servers address these replies to us first (`<me> <channel> :<topic>`,
/// `<me> <sym> <channel> :<names>`). That form is recognised only when the
/// first parameter is not a channel and the remainder is exactly a channel
/// (after an optional `=`, `*` or `@` symbol) followed by ` :` and the text.
/// Otherwise the first parameter is the channel and the remainder is the
/// text.
fn split_reply<'a>(first: &'a str, rest: &'a str) -> (&'a str, &'a str) {
    if !is_channel(first) {
        if let Some((head, text)) = rest.split_once(" :") {
            let mut tokens = head.split(' ').rev();
            if let Some(channel) = tokens.next().filter(|t| is_channel(t)) {
                if tokens.all(|t| matches!(t, "=" | "*" | "@")) {
                    return (channel, text);
                }
            }
        }
    }
    (first, strip_colon(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(nick: &str) -> SessionState {
        SessionState::new("irc.example.com", 6667, nick)
    }

    fn event(line: &str) -> ClientEvent {
        dispatch(&ParsedMessage::parse(line), &mut state("me"))
            .event()
            .expect("expected an event")
    }

    #[test]
    fn test_ping_replies_with_pong() {
        let msg = ParsedMessage::parse("PING :abc123");
        assert_eq!(msg.params, vec![":abc123"]);
        assert_eq!(
            dispatch(&msg, &mut state("me")),
            Dispatch::Reply(encode::pong(":abc123"))
        );
        assert_eq!(encode::pong(":abc123").as_str(), "PONG :abc123");
    }

    #[test]
    fn test_ping_echoes_all_params() {
        let msg = ParsedMessage::parse("PING :irc.example.com extra words");
        match dispatch(&msg, &mut state("me")) {
            Dispatch::Reply(cmd) => assert_eq!(cmd.as_str(), "PONG :irc.example.com extra words"),
            other => panic!("expected reply, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_ping_is_unrecognized() {
        assert_eq!(
            event("PING"),
            ClientEvent::Unrecognized {
                raw: "PING".to_string()
            }
        );
    }

    #[test]
    fn test_privmsg() {
        assert_eq!(
            event(":alice!u@h PRIVMSG #room :hello there"),
            ClientEvent::ChatMessage {
                nick: "alice".to_string(),
                target: "#room".to_string(),
                text: "hello there".to_string(),
            }
        );
    }

    #[test]
    fn test_privmsg_without_text_is_unrecognized() {
        assert!(matches!(
            event(":alice!u@h PRIVMSG #room"),
            ClientEvent::Unrecognized { .. }
        ));
    }

    #[test]
    fn test_join_and_part() {
        assert_eq!(
            event(":bob!u@h JOIN #room"),
            ClientEvent::Joined {
                nick: "bob".to_string(),
                channel: "#room".to_string(),
            }
        );
        assert_eq!(
            event(":bob!u@h JOIN :#room"),
            ClientEvent::Joined {
                nick: "bob".to_string(),
                channel: "#room".to_string(),
            }
        );
        assert_eq!(
            event(":bob!u@h PART #room :see you"),
            ClientEvent::Parted {
                nick: "bob".to_string(),
                channel: "#room".to_string(),
            }
        );
    }

    #[test]
    fn test_quit_reason() {
        assert_eq!(
            event(":bob!u@h QUIT :Gone to lunch"),
            ClientEvent::Quit {
                nick: "bob".to_string(),
                reason: "Gone to lunch".to_string(),
            }
        );
        assert_eq!(
            event(":bob!u@h QUIT"),
            ClientEvent::Quit {
                nick: "bob".to_string(),
                reason: String::new(),
            }
        );
    }

    #[test]
    fn test_nick_change_updates_own_nickname() {
        let mut session = state("bob");
        let msg = ParsedMessage::parse(":bob!u@h NICK bobby");
        assert_eq!(
            dispatch(&msg, &mut session),
            Dispatch::Event(ClientEvent::NickChanged {
                old_nick: "bob".to_string(),
                new_nick: "bobby".to_string(),
            })
        );
        assert_eq!(session.nickname(), "bobby");
    }

    #[test]
    fn test_nick_change_of_other_user() {
        let mut session = state("alice");
        let msg = ParsedMessage::parse(":bob!u@h NICK :bobby");
        assert_eq!(
            dispatch(&msg, &mut session),
            Dispatch::Event(ClientEvent::NickChanged {
                old_nick: "bob".to_string(),
                new_nick: "bobby".to_string(),
            })
        );
        assert_eq!(session.nickname(), "alice");
    }

    #[test]
    fn test_server_notice_numerics() {
        assert_eq!(
            event(":irc.example.com 001 me :Welcome to the Example network"),
            ClientEvent::ServerNotice {
                text: "Welcome to the Example network".to_string()
            }
        );
        assert_eq!(
            event(":irc.example.com 251 me :There are 3 users"),
            ClientEvent::ServerNotice {
                text: "There are 3 users".to_string()
            }
        );
        assert_eq!(
            event(":irc.example.com 376 me"),
            ClientEvent::ServerNotice {
                text: String::new()
            }
        );
    }

    #[test]
    fn test_topic() {
        assert_eq!(
            event(":irc.example.com 332 me #rust :All things Rust"),
            ClientEvent::Topic {
                channel: "#rust".to_string(),
                text: "All things Rust".to_string(),
            }
        );
        assert_eq!(
            event(":irc.example.com 332 #rust :Short form"),
            ClientEvent::Topic {
                channel: "#rust".to_string(),
                text: "Short form".to_string(),
            }
        );
    }

    #[test]
    fn test_names_list() {
        assert_eq!(
            event(":irc.example.com 353 me = #rust :alice @bob +carol"),
            ClientEvent::NamesList {
                names: vec!["alice".to_string(), "@bob".to_string(), "+carol".to_string()],
            }
        );
        assert_eq!(
            event(":irc.example.com 353 #rust :alice bob"),
            ClientEvent::NamesList {
                names: vec!["alice".to_string(), "bob".to_string()],
            }
        );
    }

    #[test]
    fn test_topic_short_form_with_colon_in_text() {
        assert_eq!(
            event(":srv 332 #rust topic with :colon inside"),
            ClientEvent::Topic {
                channel: "#rust".to_string(),
                text: "topic with :colon inside".to_string(),
            }
        );
        assert_eq!(
            event(":srv 332 me #rust :see: https://example.org :)"),
            ClientEvent::Topic {
                channel: "#rust".to_string(),
                text: "see: https://example.org :)".to_string(),
            }
        );
        // Not a channel before the marker: literal reading.
        assert_eq!(
            event(":srv 332 me words here :more"),
            ClientEvent::Topic {
                channel: "me".to_string(),
                text: "words here :more".to_string(),
            }
        );
    }

    #[test]
    fn test_names_short_form_with_colon_in_text() {
        assert_eq!(
            event(":srv 353 #rust alice :bob"),
            ClientEvent::NamesList {
                names: vec!["alice".to_string(), ":bob".to_string()],
            }
        );
        assert_eq!(
            event(":srv 353 me @ &local :dave"),
            ClientEvent::NamesList {
                names: vec!["dave".to_string()],
            }
        );
    }

    #[test]
    fn test_nickname_in_use() {
        assert_eq!(
            event(":irc.example.com 433 * alice :Nickname is already in use"),
            ClientEvent::NicknameInUse
        );
    }

    #[test]
    fn test_unrecognized_keeps_raw_line() {
        let line = ":irc.example.com NOTICE * :*** Looking up your hostname";
        assert_eq!(
            event(line),
            ClientEvent::Unrecognized {
                raw: line.to_string()
            }
        );
        assert_eq!(
            event(":broken"),
            ClientEvent::Unrecognized {
                raw: ":broken".to_string()
            }
        );
    }
}
