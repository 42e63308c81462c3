#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mpk_decoder::{MsgPackReader, Outcome, ReaderConfig, Value};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    bytes: Vec<u8>,
    /// Chunk lengths cycled while feeding; zero is allowed.
    chunks: Vec<u8>,
    max_blob_len: Option<u16>,
}

// Fuzz target: MsgPackReader over arbitrary bytes in arbitrary chunks.
//
// The reader must never panic on malformed input, and suspension must
// never move the cursor. Every protocol error is followed by a discard
// and the walk continues with the rest of the input.
fuzz_target!(|input: FuzzInput| {
    let mut config = ReaderConfig::default().with_initial_capacity(8);
    if let Some(limit) = input.max_blob_len {
        config = config.with_max_blob_len(usize::from(limit));
    }
    let Ok(mut reader) = MsgPackReader::with_config(config) else {
        return;
    };

    let mut fed = 0;
    let mut chunk_lens = input.chunks.iter().copied().cycle();
    loop {
        let cursor = reader.read_cursor();
        match reader.read_value() {
            Ok(Outcome::Decoded { value, consumed }) => {
                assert!(consumed > 0);
                assert_eq!(reader.read_cursor(), cursor + consumed);
                if let Value::Bin(view) = value {
                    assert_eq!(reader.view(view).map(<[u8]>::len), Ok(view.len()));
                }
            }
            Ok(Outcome::NeedMoreData) => {
                assert_eq!(reader.read_cursor(), cursor);
                if fed == input.bytes.len() {
                    break;
                }
                let len = usize::from(chunk_lens.next().unwrap_or(1)).max(1);
                let end = input.bytes.len().min(fed + len);
                if reader.feed(&input.bytes[fed..end]).is_err() {
                    return;
                }
                fed = end;
            }
            Err(e) => {
                assert!(e.is_protocol());
                assert_eq!(reader.read_cursor(), cursor);
                reader.discard_message();
            }
        }
    }
});
