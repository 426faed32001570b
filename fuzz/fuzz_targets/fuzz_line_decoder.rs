//! Fuzz target: `LineDecoder::feed`
//!
//! Splits arbitrary input at a fuzzer-chosen point and feeds both halves,
//! checking that a completed line never carries its terminator and that
//! the buffer never grows past `MAX_LINE`.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use autoboiler::rpc::codec::{LineDecoder, MAX_LINE};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let at = usize::from(split).min(rest.len());
    let (head, tail) = rest.split_at(at);

    let mut decoder = LineDecoder::new();
    for chunk in [head, tail] {
        if let Ok(Some(line)) = decoder.feed(chunk) {
            assert!(!line.ends_with('\n'));
            assert!(line.len() <= MAX_LINE);
            return;
        }
        assert!(decoder.buffered() <= MAX_LINE);
    }
    let _ = decoder.finish();
});
