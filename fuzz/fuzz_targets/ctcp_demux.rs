//! Fuzz target for CTCP demultiplexing
//!
//! Every delimited payload must come back without delimiters, and the
//! residual must never contain one.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_engine::ctcp::{self, CtcpMessage, DELIMITER};
use std::str;

fuzz_target!(|data: &[u8]| {
    if let Ok(body) = str::from_utf8(data) {
        let demuxed = ctcp::demux(body);
        for payload in &demuxed.ctcp {
            assert!(!payload.contains(DELIMITER));
            let _ = CtcpMessage::parse(payload, true, None, "fuzzer");
        }
        if let Some(residual) = &demuxed.residual {
            assert!(!residual.contains(DELIMITER));
        }
    }
});
