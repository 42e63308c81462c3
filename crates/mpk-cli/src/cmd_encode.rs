/// Implementation of `mpk encode`.
///
/// Reads a JSON array and writes each element as one wire token using
/// `MsgPackWriter`, which picks the smallest encoding for every value.
///
/// # Input format
///
/// ```text
/// ┌─────────────────────────┬──────────────────────────────────────────┐
/// │ JSON element            │ Token written                            │
/// ├─────────────────────────┼──────────────────────────────────────────┤
/// │ null                    │ nil                                      │
/// │ true / false            │ true / false                             │
/// │ integer (fits i64)      │ fixint, int8..int64 or uint8..uint64     │
/// │ integer (> i64::MAX)    │ uint64                                   │
/// │ number with a fraction  │ float64                                  │
/// │ {"bin": "<hex>"}        │ bin8, bin16 or bin32                     │
/// └─────────────────────────┴──────────────────────────────────────────┘
/// ```
use std::fs::{self, File};
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use mpk_encoder::MsgPackWriter;

use crate::EncodeArgs;

// ── Input serde types ─────────────────────────────────────────────────────────

/// A single element of the input array.
///
/// Variant order matters: serde tries them top to bottom, so integers are
/// claimed before they could be read as floats.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum Item {
    Nil(()),
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bin { bin: String },
}

impl Item {
    /// Upper bound on the encoded size of this element.
    fn max_encoded_len(&self) -> usize {
        match self {
            Self::Nil(()) | Self::Bool(_) => 1,
            Self::Bin { bin } => 5 + bin.len() / 2,
            Self::Int(_) | Self::Uint(_) | Self::Float(_) => 9,
        }
    }
}

/// Run the `mpk encode` command.
///
/// # Errors
///
/// Returns an error if the input cannot be read or parsed, a `bin` field
/// is not valid hex, or the output cannot be written.
pub fn run(args: &EncodeArgs) -> Result<()> {
    let json = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let items: Vec<Item> = serde_json::from_str(&json)
        .with_context(|| format!("{} is not a JSON array of values", args.input.display()))?;

    let writer = encode_items(&items)?;

    let file = File::create(&args.output)
        .with_context(|| format!("cannot create {}", args.output.display()))?;
    let mut out = BufWriter::new(file);
    let written = writer
        .write_to(&mut out)
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    out.flush()
        .with_context(|| format!("cannot write {}", args.output.display()))?;

    println!(
        "Wrote {written} bytes ({} value{}) to {}",
        items.len(),
        if items.len() == 1 { "" } else { "s" },
        args.output.display()
    );
    Ok(())
}

fn encode_items(items: &[Item]) -> Result<MsgPackWriter> {
    let mut writer = MsgPackWriter::with_capacity(items.iter().map(Item::max_encoded_len).sum());
    for (idx, item) in items.iter().enumerate() {
        match item {
            Item::Nil(()) => {
                writer.write_nil();
            }
            Item::Bool(b) => {
                writer.write_bool(*b);
            }
            Item::Int(i) => {
                writer.write_int(*i);
            }
            Item::Uint(u) => {
                writer.write_uint(*u);
            }
            Item::Float(f) => {
                writer.write_f64(*f);
            }
            Item::Bin { bin } => {
                let data =
                    hex::decode(bin).with_context(|| format!("element {idx}: invalid hex"))?;
                writer
                    .write_bin(&data)
                    .with_context(|| format!("element {idx}: cannot encode blob"))?;
            }
        }
    }
    Ok(writer)
}
