#![no_main]

use framewire::protocol::{decode_frame, FrameDecoder, LengthPrefix};
use libfuzzer_sys::arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;

const MAX_LEN: usize = 1 << 20;

#[derive(Debug)]
struct StreamingInput {
    data: Vec<u8>,
    split_points: Vec<u8>,
}

impl<'a> Arbitrary<'a> for StreamingInput {
    fn arbitrary(u: &mut Unstructured<'a>) -> libfuzzer_sys::arbitrary::Result<Self> {
        let data: Vec<u8> = u.arbitrary()?;
        let split_points: Vec<u8> = u.arbitrary()?;
        Ok(Self { data, split_points })
    }
}

fuzz_target!(|input: StreamingInput| {
    if input.data.is_empty() {
        return;
    }

    let mut splits: Vec<usize> = input
        .split_points
        .iter()
        .map(|&b| (b as usize) % (input.data.len() + 1))
        .collect();
    splits.push(0);
    splits.push(input.data.len());
    splits.sort_unstable();
    splits.dedup();

    // Frames decoded from arbitrary chunking must match one-shot decoding
    let mut decoder = FrameDecoder::with_max_length(LengthPrefix::U64Le, MAX_LEN);
    let mut streamed = Vec::new();
    'chunks: for window in splits.windows(2) {
        decoder.extend(&input.data[window[0]..window[1]]);
        loop {
            match decoder.next_frame() {
                Ok(Some(payload)) => streamed.push(payload),
                Ok(None) => break,
                Err(_) => break 'chunks,
            }
        }
    }

    let mut rest = &input.data[..];
    for payload in &streamed {
        let (expected, consumed) =
            decode_frame(LengthPrefix::U64Le, rest, MAX_LEN).expect("streamed frame decodes");
        assert_eq!(&expected, payload);
        rest = &rest[consumed..];
    }
});
