#![no_main]

use classweave::classfile::{MethodDesc, TypeDesc};
use classweave::matching::ShapePattern;
use libfuzzer_sys::fuzz_target;

// The three text grammars reachable from untrusted input. Parsing must never panic;
// whatever survives must display back to text that re-parses.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(desc) = TypeDesc::parse(text) {
        let _ = TypeDesc::parse(desc.raw()).expect("display form re-parses");
    }
    if let Ok(desc) = MethodDesc::parse(text) {
        let _ = MethodDesc::parse(desc.raw()).expect("display form re-parses");
    }
    if let Ok(pattern) = ShapePattern::parse(text) {
        let _ = ShapePattern::parse(&pattern.to_string()).expect("display form re-parses");
    }
});
