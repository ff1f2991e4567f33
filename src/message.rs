//! IRC message parsing.
//!
//! A line has the shape:
//!
//! ```text
//! [:prefix ]<command>[ <param>[ <rest>]]
//! ```
//!
//! The parser splits at most three tokens after the prefix. The third token
//! is the remainder of the line: it may contain spaces and keeps its leading
//! `:` so that handlers needing the text verbatim can have it. Stripping the
//! colon is the consumer's job (see [`strip_colon`]).
//!
//! Parsing never fails. A line the grammar cannot make sense of becomes a
//! message whose command is the whole line and which has no parameters; the
//! dispatcher reports it as unrecognized instead of dropping the session.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use nom::{
    bytes::complete::take_till,
    character::complete::char,
    combinator::{opt, rest},
    sequence::{preceded, terminated},
    IResult,
};

/// A parsed IRC line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedMessage {
    /// Sender, without the leading `:`.
    pub prefix: Option<String>,
    /// Command name or three-digit numeric.
    pub command: String,
    /// Up to two parameters; the last one is the unsplit remainder.
    pub params: Vec<String>,
}

/// Parse `:prefix ` (the trailing space is consumed).
fn parse_prefix(input: &str) -> IResult<&str, &str> {
    terminated(preceded(char(':'), take_till(|c| c == ' ')), char(' '))(input)
}

fn parse_token(input: &str) -> IResult<&str, &str> {
    take_till(|c| c == ' ')(input)
}

fn parse_message(input: &str) -> IResult<&str, (Option<&str>, &str, Vec<&str>)> {
    let (input, prefix) = if input.starts_with(':') {
        let (input, prefix) = parse_prefix(input)?;
        (input, Some(prefix))
    } else {
        (input, None)
    };

    let (input, command) = parse_token(input)?;

    let mut params = Vec::with_capacity(2);
    let (input, first) = opt(preceded(char(' '), parse_token))(input)?;
    let input = match first {
        Some(first) => {
            params.push(first);
            let (input, remainder) = opt(preceded(char(' '), rest))(input)?;
            params.extend(remainder);
            input
        }
        None => input,
    };

    Ok((input, (prefix, command, params)))
}

impl ParsedMessage {
    /// Parse a single line. Any trailing `\r\n` is ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use slirc_client::message::ParsedMessage;
    ///
    /// let msg = ParsedMessage::parse(":alice!u@h PRIVMSG #room :hello there");
    /// assert_eq!(msg.prefix.as_deref(), Some("alice!u@h"));
    /// assert_eq!(msg.command, "PRIVMSG");
    /// assert_eq!(msg.params, vec!["#room", ":hello there"]);
    /// ```
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);

        match parse_message(line) {
            Ok((_, (prefix, command, params))) if !command.is_empty() => Self {
                prefix: prefix.map(str::to_owned),
                command: command.to_owned(),
                params: params.into_iter().map(str::to_owned).collect(),
            },
            _ => Self::degraded(line),
        }
    }

    fn degraded(line: &str) -> Self {
        Self {
            prefix: None,
            command: line.to_owned(),
            params: Vec::new(),
        }
    }

    /// The sender's nickname.
    ///
    /// `nick!user@host` yields `nick`; a prefix without `!` (a server name)
    /// is returned whole; no prefix yields an empty string.
    pub fn nick(&self) -> &str {
        match &self.prefix {
            Some(prefix) => prefix.split('!').next().unwrap_or(prefix.as_str()),
            None => "",
        }
    }

    /// Parameter `index`, if present.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }
}

impl FromStr for ParsedMessage {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for ParsedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        f.write_str(&self.command)?;
        for param in &self.params {
            write!(f, " {}", param)?;
        }
        Ok(())
    }
}

/// Remove one leading `:` from a parameter, if present.
#[inline]
pub fn strip_colon(s: &str) -> &str {
    s.strip_prefix(':').unwrap_or(s)
}
