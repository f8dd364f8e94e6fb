//! Presenter authority resolver CLI.
//!
//! Reads an authority snapshot (JSON) from a file or stdin and prints the
//! resolution (JSON) to stdout. Logs go to stderr.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin podium-resolve -- --snapshot snapshot.json --pretty
//! cat snapshot.json | cargo run --bin podium-resolve -- --now 20000
//! ```

use std::path::PathBuf;

use clap::Parser;

use podium_authority::ui::{ResolveOptions, run_resolve};
use podium_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "podium-resolve")]
#[command(about = "Resolve who holds presenter control in a collaborative session", long_about = None)]
struct Args {
    /// Snapshot JSON file ("-" or omitted reads stdin)
    #[arg(short = 's', long)]
    snapshot: Option<PathBuf>,

    /// Current time in epoch milliseconds (overrides nowTs)
    #[arg(short = 'n', long)]
    now: Option<i64>,

    /// Broadcast freshness window in milliseconds (overrides broadcastSignalWindowMs)
    #[arg(short = 'w', long)]
    window: Option<i64>,

    /// Pretty-print the resolution
    #[arg(short = 'p', long)]
    pretty: bool,
}

fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let options = ResolveOptions {
        snapshot: args.snapshot,
        now: args.now,
        window: args.window,
        pretty: args.pretty,
    };
    if let Err(e) = run_resolve(options) {
        tracing::error!("Resolve error: {}", e);
        std::process::exit(1);
    }
}
