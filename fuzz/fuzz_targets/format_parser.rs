//! Fuzz target for the formatting parser
//!
//! Runs must cover exactly the text left after stripping formatting codes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_engine::format::{self, FormattedStringExt};
use std::str;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = str::from_utf8(data) {
        let text: String = format::parse(input).map(|run| run.text()).collect();
        assert_eq!(text, input.strip_formatting());
    }
});
