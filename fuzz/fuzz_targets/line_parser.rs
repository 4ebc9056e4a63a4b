//! Fuzz target for received-line parsing
//!
//! Feeds arbitrary text to the line grammar and to a session, which must
//! reject bad input with an error rather than panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_engine::{Line, Session, SessionConfig};
use std::str;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = str::from_utf8(data) {
        if input.len() > 4096 {
            return;
        }

        let _ = Line::parse(input);

        let session = Session::new(SessionConfig::default());
        let _ = session.receive(input);
    }
});
