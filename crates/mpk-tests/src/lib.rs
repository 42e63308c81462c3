//! Shared helpers for the integration suites and benches.
//!
//! The helpers play the transport role: they cut an encoded byte stream
//! into chunks, feed the reader one chunk at a time, and keep retrying
//! whatever decode call reported `NeedMoreData`.

use std::fmt::Write as _;

use mpk_decoder::{DecodeError, MsgPackReader, Next, Outcome, ReaderConfig, Value};
use mpk_encoder::MsgPackWriter;

/// A decoded value with blob payloads copied out of the arena.
#[derive(Clone, Debug, PartialEq)]
pub enum Owned {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Bin(Vec<u8>),
}

impl Owned {
    /// Copy a reader value out, resolving blob views immediately.
    ///
    /// # Errors
    ///
    /// [`DecodeError::StaleView`] if the view no longer resolves.
    pub fn from_value(reader: &MsgPackReader, value: Value) -> Result<Self, DecodeError> {
        Ok(match value {
            Value::Nil => Self::Nil,
            Value::Bool(b) => Self::Bool(b),
            Value::Int(i) => Self::Int(i),
            Value::Float(f) => Self::Float(f),
            Value::Bin(view) => Self::Bin(reader.view(view)?.to_vec()),
        })
    }

    /// Append this value with the smallest encoding.
    pub fn write(&self, w: &mut MsgPackWriter) {
        match self {
            Self::Nil => {
                w.write_nil();
            }
            Self::Bool(b) => {
                w.write_bool(*b);
            }
            Self::Int(i) => {
                w.write_int(*i);
            }
            Self::Float(f) => {
                w.write_f64(*f);
            }
            Self::Bin(data) => {
                w.write_bin(data).expect("test blobs fit in bin32");
            }
        }
    }
}

/// Everything a chunked decode produced.
#[derive(Debug, PartialEq)]
pub struct Decoded {
    pub values: Vec<Owned>,
    /// Committed bytes left unconsumed when input ran out.
    pub leftover: usize,
}

/// A reader with a deliberately small arena so tests exercise growth.
pub fn small_reader() -> MsgPackReader {
    MsgPackReader::with_config(ReaderConfig::default().with_initial_capacity(16))
        .expect("16-byte arena")
}

/// Feed `bytes` in `chunk_len`-byte pieces and decode every value.
///
/// # Errors
///
/// The first protocol error the reader reports.
pub fn decode_in_chunks(bytes: &[u8], chunk_len: usize) -> Result<Decoded, DecodeError> {
    let chunk_len = chunk_len.max(1);
    let cuts: Vec<usize> = (chunk_len..bytes.len()).step_by(chunk_len).collect();
    decode_with_cuts(bytes, &cuts)
}

/// Feed `bytes` split at `cuts` and decode every value.
///
/// Cut points past the end are clamped; unsorted or repeated cuts yield
/// empty chunks, which the reader must tolerate.
///
/// # Errors
///
/// The first protocol error the reader reports.
pub fn decode_with_cuts(bytes: &[u8], cuts: &[usize]) -> Result<Decoded, DecodeError> {
    let mut reader = small_reader();
    let mut chunks = split(bytes, cuts).into_iter();
    let mut values = Vec::new();
    loop {
        match reader.read_value()? {
            Outcome::Decoded { value, .. } => values.push(Owned::from_value(&reader, value)?),
            Outcome::NeedMoreData => match chunks.next() {
                Some(chunk) => reader.feed(chunk)?,
                None => break,
            },
        }
    }
    Ok(Decoded {
        values,
        leftover: reader.remaining(),
    })
}

/// Slice `bytes` at the given cut points, in order.
pub fn split<'a>(bytes: &'a [u8], cuts: &[usize]) -> Vec<&'a [u8]> {
    let mut chunks = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for &cut in cuts {
        let end = cut.clamp(start, bytes.len());
        chunks.push(&bytes[start..end]);
        start = end;
    }
    chunks.push(&bytes[start..]);
    chunks
}

/// Encode `values` with the smallest encodings.
pub fn encode(values: &[Owned]) -> Vec<u8> {
    let mut w = MsgPackWriter::new();
    for value in values {
        value.write(&mut w);
    }
    w.finish()
}

/// A message touching every family and a range of widths.
pub fn sample_message() -> Vec<u8> {
    let mut w = MsgPackWriter::new();
    w.write_nil()
        .write_bool(true)
        .write_int(7)
        .write_int(-5)
        .write_int(200)
        .write_int(-1_000)
        .write_int(70_000)
        .write_int(-3_000_000_000)
        .write_f32(1.5)
        .write_f64(-0.25);
    w.write_bin(b"sensor-42").expect("short blob");
    w.write_bin(&[0xAB; 300]).expect("bin16 blob");
    w.finish()
}

/// Render the reader's call-by-call behaviour while `bytes` arrives in
/// `chunk_len`-byte pieces.
///
/// Each line is one call: `feed`, `next`, or the typed read that
/// followed. Used for snapshot tests of the suspend/resume protocol.
///
/// # Panics
///
/// Panics on any decode error.
pub fn trace(bytes: &[u8], chunk_len: usize) -> String {
    let mut reader = small_reader();
    let mut chunks = bytes.chunks(chunk_len.max(1));
    let mut out = String::new();
    loop {
        match reader.next().expect("well-formed input") {
            Next::End => unreachable!("trace never ends a message"),
            Next::NeedMoreData => {
                let Some(chunk) = chunks.next() else {
                    let _ = writeln!(out, "next -> need more data; input exhausted");
                    return out;
                };
                let _ = writeln!(out, "next -> need more data; feed {}", spaced_hex(chunk));
                reader.feed(chunk).expect("feed");
            }
            Next::Token(marker) => {
                let _ = write!(out, "next -> {marker}; read");
                match reader.read_value().expect("well-formed input") {
                    Outcome::Decoded { value, consumed } => {
                        let owned = Owned::from_value(&reader, value).expect("fresh view");
                        let _ = writeln!(
                            out,
                            " -> {owned:?} ({consumed} bytes, cursor {})",
                            reader.read_cursor()
                        );
                    }
                    Outcome::NeedMoreData => {
                        let Some(chunk) = chunks.next() else {
                            let _ = writeln!(
                                out,
                                " -> need more data; input exhausted with {} bytes buffered",
                                reader.remaining()
                            );
                            return out;
                        };
                        let _ = writeln!(out, " -> need more data; feed {}", spaced_hex(chunk));
                        reader.feed(chunk).expect("feed");
                    }
                }
            }
        }
    }
}

fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
