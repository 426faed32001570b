//! Fuzz target: control-socket request parsing
//!
//! Any UTF-8 line either fails to parse or yields a request whose printed
//! form parses back to the same request.
//!
//! cargo fuzz run fuzz_request_parser

#![no_main]

use autoboiler::rpc::request::Request;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(request) = line.parse::<Request>() {
        let reprinted = request.to_string();
        assert_eq!(reprinted.parse::<Request>().ok(), Some(request), "{reprinted}");
    }
});
