/// Implementation of `mpk inspect`.
///
/// Walks the file token by token and prints one line per token. The
/// walk feeds the reader `--chunk-size` bytes at a time, so a token that
/// straddles a chunk boundary goes through the same suspend/resume path
/// as a token split across socket reads.
///
/// # Output format
///
/// ```text
/// 0x000000  fixint     1
/// 0x000001  uint16     1000
/// 0x000004  nil
/// 0x000005  bin8       7 bytes
///             0000  70 61 79 6c 6f 61 64                              payload
/// 0x00000e  float64    0.5
/// ---
/// 5 tokens in 1 message, 23 bytes, arena capacity 1048576
/// ```
use std::fs;

use anyhow::{Context, Result, bail};
use mpk_decoder::ReaderConfig;

use crate::InspectArgs;
use crate::walk::{Owned, Step, Walker};

/// Run the `mpk inspect` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a token is malformed, or
/// the file ends inside a token.
pub fn run(args: &InspectArgs) -> Result<()> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;

    let mut walker = Walker::new(
        &bytes,
        args.chunk_size,
        args.values_per_message,
        ReaderConfig::default(),
    )?;

    let mut tokens = 0usize;
    loop {
        let step = walker
            .step()
            .with_context(|| format!("failed to decode {}", args.file.display()))?;
        let token = match step {
            Step::Token(token) => token,
            Step::Eof => break,
            Step::Truncated { offset, buffered } => {
                bail!("input ends inside the token at 0x{offset:06x} ({buffered} bytes buffered)")
            }
        };
        tokens += 1;

        let marker = token.marker.name();
        match &token.value {
            Owned::Nil => println!("0x{:06x}  {marker}", token.offset),
            Owned::Bool(b) => println!("0x{:06x}  {marker:<9}  {b}", token.offset),
            Owned::Int(i) => println!("0x{:06x}  {marker:<9}  {i}", token.offset),
            Owned::Float(f) => println!("0x{:06x}  {marker:<9}  {f}", token.offset),
            Owned::Bin(data) => {
                println!("0x{:06x}  {marker:<9}  {} bytes", token.offset, data.len());
                if args.show_hex {
                    print_hex_dump(data);
                }
            }
        }
    }

    let messages = walker.messages();
    println!("---");
    println!(
        "{tokens} token{} in {messages} message{}, {} bytes, arena capacity {}",
        plural(tokens),
        plural(messages),
        bytes.len(),
        walker.capacity()
    );

    Ok(())
}

// ── Formatting helpers ────────────────────────────────────────────────────────

fn print_hex_dump(data: &[u8]) {
    for (i, chunk) in data.chunks(16).enumerate() {
        let offset = i * 16;
        let hex = spaced_hex(chunk);
        let ascii: String = chunk
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
            .collect();
        println!("            {offset:04x}  {hex:<48}  {ascii}");
    }
}

/// Lowercase hex, one space between bytes.
fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
