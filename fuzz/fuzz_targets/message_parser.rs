//! Fuzz target for IRC message parsing and dispatch
//!
//! Feeds arbitrary lines to the parser and the dispatcher. Neither may panic,
//! and a parsed line must print back exactly as it came in.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_client::{dispatch, ParsedMessage, SessionState};

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    if input.len() > 512 {
        return;
    }

    let msg = ParsedMessage::parse(&input);
    if !input.contains(['\r', '\n']) {
        assert_eq!(msg.to_string(), input);
    }

    let mut state = SessionState::new("irc.example.com", 6667, "fuzz");
    let _ = dispatch(&msg, &mut state);
});
