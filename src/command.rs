//! Operator input grammar.
//!
//! A line typed by the user is either plain text for the current channel or
//! a slash-command. [`UserCommand::parse`] decides which; the session turns
//! the result into wire commands.
//!
//! | Input | Command |
//! |---|---|
//! | `/join <chan>` | [`UserCommand::Join`] |
//! | `/part`, `/leave` | [`UserCommand::Part`] |
//! | `/msg <target> <text>` | [`UserCommand::Msg`] |
//! | `/nick <new>` | [`UserCommand::Nick`] |
//! | `/quit [reason]` | [`UserCommand::Quit`] |
//! | `/<anything else>` | [`UserCommand::Raw`] |
//! | text | [`UserCommand::Say`] |
//!
//! Command names are case-insensitive. `/join`, `/msg` and `/nick` without
//! an argument are not special: they go to the server as raw commands.

/// A parsed line of operator input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserCommand {
    /// Plain text for the current channel.
    Say(String),
    /// Join a channel (`#` is added when missing).
    Join(String),
    /// Leave the current channel.
    Part,
    /// Private message to a nick or channel.
    Msg { target: String, text: String },
    /// Request a nickname change.
    Nick(String),
    /// Disconnect, with an optional reason.
    Quit(Option<String>),
    /// Send the text after the slash verbatim.
    Raw(String),
}

impl UserCommand {
    /// Parse one line of input.
    ///
    /// Returns `None` when there is nothing to do: blank input, a bare `/`,
    /// or `/msg` with a target but no text.
    ///
    /// # Example
    ///
    /// ```
    /// use slirc_client::command::UserCommand;
    ///
    /// assert_eq!(UserCommand::parse("/JOIN rust"), Some(UserCommand::Join("rust".into())));
    /// assert_eq!(UserCommand::parse("hello"), Some(UserCommand::Say("hello".into())));
    /// assert_eq!(UserCommand::parse("/whois bob"), Some(UserCommand::Raw("whois bob".into())));
    /// assert_eq!(UserCommand::parse("/msg bob"), None);
    /// ```
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let Some(body) = input.strip_prefix('/') else {
            return Some(Self::Say(input.to_owned()));
        };

        let (name, arg) = match body.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim_start()).filter(|a| !a.is_empty())),
            None => (body, None),
        };

        let command = match (name.to_ascii_lowercase().as_str(), arg) {
            ("join", Some(channel)) => Self::Join(channel.to_owned()),
            ("part" | "leave", _) => Self::Part,
            ("msg", Some(arg)) => {
                let (target, text) = arg.split_once(char::is_whitespace)?;
                let text = text.trim_start();
                if text.is_empty() {
                    return None;
                }
                Self::Msg {
                    target: target.to_owned(),
                    text: text.to_owned(),
                }
            }
            ("nick", Some(nick)) => Self::Nick(nick.to_owned()),
            ("quit", reason) => Self::Quit(reason.map(str::to_owned)),
            _ if body.trim().is_empty() => return None,
            _ => Self::Raw(body.to_owned()),
        };
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(
            UserCommand::parse("  hi there  "),
            Some(UserCommand::Say("hi there".to_string()))
        );
        assert_eq!(UserCommand::parse("   "), None);
        assert_eq!(UserCommand::parse(""), None);
    }

    #[test]
    fn test_join() {
        assert_eq!(
            UserCommand::parse("/join #rust"),
            Some(UserCommand::Join("#rust".to_string()))
        );
        assert_eq!(
            UserCommand::parse("/Join   rust"),
            Some(UserCommand::Join("rust".to_string()))
        );
        assert_eq!(
            UserCommand::parse("/join"),
            Some(UserCommand::Raw("join".to_string()))
        );
    }

    #[test]
    fn test_part_and_leave() {
        assert_eq!(UserCommand::parse("/part"), Some(UserCommand::Part));
        assert_eq!(UserCommand::parse("/LEAVE"), Some(UserCommand::Part));
        assert_eq!(UserCommand::parse("/part #other"), Some(UserCommand::Part));
    }

    #[test]
    fn test_msg() {
        assert_eq!(
            UserCommand::parse("/msg bob hello  there"),
            Some(UserCommand::Msg {
                target: "bob".to_string(),
                text: "hello  there".to_string(),
            })
        );
        assert_eq!(UserCommand::parse("/msg bob"), None);
        assert_eq!(
            UserCommand::parse("/msg"),
            Some(UserCommand::Raw("msg".to_string()))
        );
    }

    #[test]
    fn test_nick() {
        assert_eq!(
            UserCommand::parse("/nick bobby"),
            Some(UserCommand::Nick("bobby".to_string()))
        );
        assert_eq!(
            UserCommand::parse("/NICK"),
            Some(UserCommand::Raw("NICK".to_string()))
        );
    }

    #[test]
    fn test_quit() {
        assert_eq!(UserCommand::parse("/quit"), Some(UserCommand::Quit(None)));
        assert_eq!(
            UserCommand::parse("/quit see you"),
            Some(UserCommand::Quit(Some("see you".to_string())))
        );
    }

    #[test]
    fn test_unknown_command_is_raw() {
        assert_eq!(
            UserCommand::parse("/WHOIS alice"),
            Some(UserCommand::Raw("WHOIS alice".to_string()))
        );
        assert_eq!(
            UserCommand::parse("/mode #rust +o bob"),
            Some(UserCommand::Raw("mode #rust +o bob".to_string()))
        );
        assert_eq!(UserCommand::parse("/"), None);
    }
}
