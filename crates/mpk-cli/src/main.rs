/// MPK command-line tool: inspect, validate and produce files in the
/// MessagePack subset accepted by `mpk-decoder`.
///
/// # Command overview
///
/// ```text
/// mpk <COMMAND> [OPTIONS]
///
/// Commands:
///   inspect    Print every token with its offset, tag and value
///   validate   Decode a file and report per-family token counts
///   encode     Create a file from a JSON array of values
///   help       Print help information
///
/// Global options:
///   -v, --verbose    Log decoder events (arena growth, compaction, errors)
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// Files are fed to the reader in fixed-size chunks rather than all at
/// once, so the tool exercises the same suspend/resume path a socket
/// would.
///
/// # Exit codes
///
/// | Code | Meaning                                      |
/// |------|----------------------------------------------|
/// | 0    | Success                                      |
/// | 1    | Error (I/O failure, malformed input, etc.)   |
///
/// All error details are written to stderr so stdout can be piped cleanly.
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd_encode;
mod cmd_inspect;
mod cmd_validate;
mod walk;

// ── CLI root ──────────────────────────────────────────────────────────────────

/// The MPK command-line tool.
#[derive(Parser)]
#[command(name = "mpk", version, about = "MessagePack subset inspection CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log decoder events at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Print every token with its offset, tag and value.
    Inspect(InspectArgs),
    /// Decode a file and report per-family token counts.
    Validate(ValidateArgs),
    /// Create a file from a JSON array of values.
    Encode(EncodeArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `mpk inspect`.
///
/// ```text
/// ┌──────────────────────┬───────────────────────────────────────────────┐
/// │ Flag                 │ Effect                                        │
/// ├──────────────────────┼───────────────────────────────────────────────┤
/// │ --chunk-size N       │ Feed the reader N bytes at a time (4096)      │
/// │ --values-per-message │ Close and compact a message every K values    │
/// │ --show-hex           │ Hex dump blob payloads (16 bytes per line)    │
/// └──────────────────────┴───────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct InspectArgs {
    /// Path to the file to inspect.
    pub file: PathBuf,

    /// Number of bytes handed to the reader per feed.
    #[arg(long, default_value = "4096")]
    pub chunk_size: NonZeroUsize,

    /// Treat every K values as one message.
    ///
    /// Without this flag the whole file is one message and the arena
    /// grows to hold all of it.
    #[arg(long)]
    pub values_per_message: Option<NonZeroUsize>,

    /// Show a hex dump of blob payloads.
    #[arg(long)]
    pub show_hex: bool,
}

/// Arguments for `mpk validate`.
///
/// Every token is decoded as its own message so memory stays bounded by
/// the largest token. Exits with code 0 on success and 1 on the first
/// malformed or truncated token.
#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Path to the file to validate.
    pub file: PathBuf,

    /// Number of bytes handed to the reader per feed.
    #[arg(long, default_value = "4096")]
    pub chunk_size: NonZeroUsize,

    /// Reject blobs longer than this many bytes.
    #[arg(long)]
    pub max_blob_len: Option<usize>,
}

/// Arguments for `mpk encode`.
///
/// The input is a JSON array whose elements map onto wire tokens:
///
/// ```json
/// [null, true, 42, -7, 18446744073709551615, 2.5, {"bin": "deadbeef"}]
/// ```
#[derive(clap::Args)]
pub struct EncodeArgs {
    /// Path to the JSON array.
    pub input: PathBuf,

    /// Output file path.
    #[arg(short, long)]
    pub output: PathBuf,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Inspect(args) => cmd_inspect::run(&args),
        Commands::Validate(args) => cmd_validate::run(&args),
        Commands::Encode(args) => cmd_encode::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

/// Install a stderr subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
