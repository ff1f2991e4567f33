//! Fuzz target for line framing
//!
//! The first byte picks a chunk size; the rest is the stream. Framing the
//! stream in chunks must give the same lines as framing it in one read.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_client::LineFramer;

fuzz_target!(|data: &[u8]| {
    let Some((&size, stream)) = data.split_first() else {
        return;
    };
    let size = usize::from(size).max(1);

    let mut whole = LineFramer::new();
    let expected: Vec<String> = whole.feed(stream).map(|l| l.into_string()).collect();

    let mut chunked = LineFramer::new();
    let mut lines = Vec::new();
    for part in stream.chunks(size) {
        lines.extend(chunked.feed(part).map(|l| l.into_string()));
    }

    assert_eq!(lines, expected);
    assert_eq!(chunked.pending(), whole.pending());
});
