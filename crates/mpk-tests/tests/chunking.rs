//! Chunking invariance and suspend/resume behaviour.
//!
//! The reader must produce the same values and the same final cursor no
//! matter how the transport slices the byte stream, and a call that
//! reports `NeedMoreData` must leave every piece of reader state alone.

use mpk_decoder::{BlobView, Marker, MsgPackReader, Outcome};
use mpk_encoder::MsgPackWriter;
use mpk_tests::{Owned, decode_in_chunks, decode_with_cuts, encode, sample_message, small_reader};
use mpk_wire::marker::tag;
use quickcheck::{Arbitrary, Gen, QuickCheck};
use quickcheck_macros::quickcheck;
use rstest::rstest;

// ── One token, every split ────────────────────────────────────────────────────

/// Every supported tag, forced to that exact encoding.
fn one_token(marker: Marker) -> Vec<u8> {
    let mut w = MsgPackWriter::new();
    match marker {
        Marker::Nil => {
            w.write_nil();
        }
        Marker::False => {
            w.write_bool(false);
        }
        Marker::True => {
            w.write_bool(true);
        }
        Marker::F32 => {
            w.write_f32(-6.5);
        }
        Marker::F64 => {
            w.write_f64(1.0e300);
        }
        Marker::Bin8 | Marker::Bin16 | Marker::Bin32 => {
            w.write_bin_as(marker, b"split me").unwrap();
        }
        Marker::PosFixInt(_) => {
            w.write_int_as(marker, 42).unwrap();
        }
        Marker::NegFixInt(_) => {
            w.write_int_as(marker, -17).unwrap();
        }
        Marker::U8 | Marker::U16 | Marker::U32 | Marker::U64 => {
            w.write_int_as(marker, 0x7F).unwrap();
        }
        Marker::I8 | Marker::I16 | Marker::I32 | Marker::I64 => {
            w.write_int_as(marker, -0x70).unwrap();
        }
    }
    w.finish()
}

#[rstest]
fn one_byte_at_a_time_matches_one_shot(
    #[values(
        Marker::PosFixInt(0),
        Marker::NegFixInt(-1),
        Marker::Nil,
        Marker::False,
        Marker::True,
        Marker::Bin8,
        Marker::Bin16,
        Marker::Bin32,
        Marker::F32,
        Marker::F64,
        Marker::U8,
        Marker::U16,
        Marker::U32,
        Marker::U64,
        Marker::I8,
        Marker::I16,
        Marker::I32,
        Marker::I64
    )]
    marker: Marker,
) {
    let bytes = one_token(marker);
    let written = Marker::from_u8(bytes[0]).unwrap();
    assert_eq!(written.name(), marker.name(), "forced encoding for {marker}");

    let whole = decode_in_chunks(&bytes, bytes.len()).unwrap();
    let trickled = decode_in_chunks(&bytes, 1).unwrap();
    assert_eq!(whole.values.len(), 1);
    assert_eq!(whole, trickled);
}

#[rstest]
fn every_two_way_split_of_the_sample(#[values(1, 2, 3, 5, 8, 13, 64)] chunk_len: usize) {
    let bytes = sample_message();
    let reference = decode_in_chunks(&bytes, bytes.len()).unwrap();
    assert_eq!(reference.values.len(), 12);
    assert_eq!(decode_in_chunks(&bytes, chunk_len).unwrap(), reference);
}

#[test]
fn cursor_ends_at_token_boundary_for_every_cut() {
    let bytes = sample_message();
    for cut in 0..=bytes.len() {
        let mut reader = small_reader();
        reader.feed(&bytes[..cut]).unwrap();
        let mut boundary = 0;
        while let Outcome::Decoded { consumed, .. } = reader.read_value().unwrap() {
            boundary += consumed;
        }
        assert_eq!(reader.read_cursor(), boundary, "cut at {cut}");
        assert_eq!(reader.used_end(), cut);

        reader.feed(&bytes[cut..]).unwrap();
        while let Outcome::Decoded { .. } = reader.read_value().unwrap() {}
        assert_eq!(reader.read_cursor(), bytes.len(), "cut at {cut}");
    }
}

// ── Suspension leaves state alone ─────────────────────────────────────────────

#[test]
fn need_more_data_does_not_mutate() {
    let mut reader = small_reader();
    reader.feed(&[tag::BIN8, 0x02, b'o', b'k']).unwrap();
    let earlier = reader.read_bin().unwrap().value().unwrap();

    // A uint32 with only two of its four payload bytes.
    reader.feed(&[tag::UINT32, 0x00, 0x01]).unwrap();
    let snapshot = (reader.read_cursor(), reader.used_end(), reader.generation());

    for _ in 0..3 {
        assert!(reader.read_int().unwrap().is_need_more_data());
        assert_eq!(
            (reader.read_cursor(), reader.used_end(), reader.generation()),
            snapshot
        );
        assert_eq!(reader.view(earlier).unwrap(), b"ok");
    }

    reader.feed(&[0x00, 0x00]).unwrap();
    assert_eq!(reader.read_int().unwrap().value(), Some(0x0001_0000));
}

#[test]
fn partial_blob_payload_keeps_header_unread() {
    let mut reader = small_reader();
    reader.feed(&[tag::BIN16, 0x00, 0x04, 1, 2]).unwrap();
    assert_eq!(reader.read_bin().unwrap(), Outcome::NeedMoreData);
    assert_eq!(reader.read_cursor(), 0);
    assert_eq!(reader.remaining(), 5);

    reader.feed(&[3, 4]).unwrap();
    let view = reader.read_bin().unwrap().value().unwrap();
    assert_eq!(reader.view(view).unwrap(), &[1, 2, 3, 4]);
}

// ── Growth ────────────────────────────────────────────────────────────────────

#[test]
fn growth_keeps_committed_bytes_at_their_offsets() {
    let mut reader = small_reader();
    let head: Vec<u8> = (0u8..12).collect();
    reader.feed(&head).unwrap();
    let before = reader.generation();

    let region = reader.reserve(1_000).unwrap();
    region[..3].copy_from_slice(&[tag::BIN8, 0x01, 0xEE]);
    reader.commit(3);

    assert!(reader.capacity() >= 1_012);
    assert!(reader.generation() > before);
    for expected in 0..12 {
        assert_eq!(reader.read_int().unwrap(), Outcome::decoded(i64::from(expected), 1));
    }
    let view: BlobView = reader.read_bin().unwrap().value().unwrap();
    assert_eq!((view.begin(), view.end()), (14, 15));
}

#[test]
fn commit_may_cover_part_of_a_reservation() {
    let mut reader = small_reader();
    let region = reader.reserve(8).unwrap();
    region[0] = tag::TRUE;
    reader.commit(1);
    assert_eq!(reader.used_end(), 1);
    assert_eq!(reader.read_bool().unwrap(), Outcome::decoded(true, 1));
}

// ── Properties ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct Stream(Vec<Owned>);

impl Arbitrary for Stream {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = usize::arbitrary(g) % 24;
        let values = (0..len)
            .map(|_| match u8::arbitrary(g) % 6 {
                0 => Owned::Nil,
                1 => Owned::Bool(bool::arbitrary(g)),
                2 => Owned::Int(i64::arbitrary(g)),
                3 => Owned::Int(i64::from(i8::arbitrary(g))),
                // NaN never compares equal, so keep to finite values.
                4 => Owned::Float(f64::from(i32::arbitrary(g)) / 8.0),
                _ => Owned::Bin(Vec::<u8>::arbitrary(g)),
            })
            .collect();
        Self(values)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let values = self.0.clone();
        Box::new((0..values.len()).map(move |i| {
            let mut fewer = values.clone();
            fewer.remove(i);
            Self(fewer)
        }))
    }
}

#[test]
fn arbitrary_cuts_decode_identically() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(stream: Stream, cuts: Vec<usize>) -> bool {
        let bytes = encode(&stream.0);
        let mut cuts: Vec<usize> = cuts.into_iter().map(|c| c % (bytes.len() + 1)).collect();
        cuts.sort_unstable();

        let decoded = decode_with_cuts(&bytes, &cuts).unwrap();
        decoded.leftover == 0 && decoded.values == stream.0
    }

    QuickCheck::new()
        .tests(500)
        .quickcheck(prop as fn(Stream, Vec<usize>) -> bool);
}

#[quickcheck]
fn truncated_stream_never_errors(stream: Stream, drop: usize) -> bool {
    let bytes = encode(&stream.0);
    let keep = bytes.len() - drop % (bytes.len() + 1);
    let decoded = decode_in_chunks(&bytes[..keep], 3).unwrap();
    decoded.values.len() <= stream.0.len()
        && decoded.values[..] == stream.0[..decoded.values.len()]
}

#[quickcheck]
fn int_reads_match_writer(value: i64, chunk_len: u8) -> bool {
    let mut w = MsgPackWriter::new();
    w.write_int(value);
    let bytes = w.finish();
    let mut reader = MsgPackReader::new().unwrap();
    let mut fed = 0;
    let step = usize::from(chunk_len).max(1);
    loop {
        match reader.read_int().unwrap() {
            Outcome::Decoded { value: got, consumed } => {
                return got == value && consumed == bytes.len();
            }
            Outcome::NeedMoreData => {
                let end = bytes.len().min(fed + step);
                reader.feed(&bytes[fed..end]).unwrap();
                fed = end;
            }
        }
    }
}
