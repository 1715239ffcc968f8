#![no_main]

use framewire::protocol::{decode_frame, LengthPrefix};
use libfuzzer_sys::fuzz_target;

const MAX_LEN: usize = 1 << 20;

fuzz_target!(|data: &[u8]| {
    // Several frames may arrive in a single TCP segment
    for prefix in [LengthPrefix::U64Le, LengthPrefix::Native] {
        let mut rest = data;
        while !rest.is_empty() {
            match decode_frame(prefix, rest, MAX_LEN) {
                Ok((payload, consumed)) => {
                    assert_eq!(consumed, prefix.width() + payload.len());
                    rest = &rest[consumed..];
                }
                Err(_) => break,
            }
        }
    }
});
