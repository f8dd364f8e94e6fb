//! `podium-resolve` execution logic.
//!
//! Reads one snapshot as JSON, resolves it and writes the resolution as JSON.

use std::io::{Read, Write};
use std::path::PathBuf;

use podium_shared::time::timestamp_to_rfc3339;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{AuthoritySnapshot, ResolutionResult, evaluate_switching_authorities};
use crate::infrastructure::dto::{ResolutionDto, SnapshotDto};

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Snapshot file could not be read
    #[error("Failed to read snapshot from {path}: {source}")]
    ReadSnapshot {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Standard input could not be read
    #[error("Failed to read snapshot from stdin: {0}")]
    ReadStdin(std::io::Error),

    /// Snapshot was not valid JSON or had the wrong shape
    #[error("Invalid snapshot JSON: {0}")]
    InvalidSnapshot(serde_json::Error),

    /// Resolution could not be rendered as JSON
    #[error("Failed to render resolution: {0}")]
    RenderOutput(serde_json::Error),

    /// Result could not be written
    #[error("Failed to write resolution: {0}")]
    WriteOutput(std::io::Error),
}

/// Options for one resolution run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Snapshot file; `None` or `-` reads stdin
    pub snapshot: Option<PathBuf>,
    /// Overrides the snapshot's `nowTs`
    pub now: Option<i64>,
    /// Overrides the snapshot's `broadcastSignalWindowMs`
    pub window: Option<i64>,
    pub pretty: bool,
}

/// Resolve a JSON snapshot and render the resolution as JSON.
pub fn resolve_json(input: &str, options: &ResolveOptions) -> Result<String, CliError> {
    let dto: SnapshotDto = serde_json::from_str(input).map_err(CliError::InvalidSnapshot)?;
    let mut snapshot = AuthoritySnapshot::from(dto);
    if options.now.is_some() {
        snapshot.now_ts = options.now;
    }
    if options.window.is_some() {
        snapshot.broadcast_signal_window_ms = options.window;
    }

    let result = evaluate_switching_authorities(&snapshot);
    log_resolution(&result);

    render(&ResolutionDto::from(result), options.pretty)
}

fn render<T: Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    output.map_err(CliError::RenderOutput)
}

/// Run the resolver end to end: read input, resolve, write stdout.
pub fn run_resolve(options: ResolveOptions) -> Result<(), CliError> {
    let input = match options.snapshot.as_deref() {
        Some(path) if path.as_os_str() != "-" => {
            tracing::debug!("Reading snapshot from {}", path.display());
            std::fs::read_to_string(path).map_err(|source| CliError::ReadSnapshot {
                path: path.to_path_buf(),
                source,
            })?
        }
        _ => {
            tracing::debug!("Reading snapshot from stdin");
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(CliError::ReadStdin)?;
            buffer
        }
    };

    let output = resolve_json(&input, &options)?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", output).map_err(CliError::WriteOutput)?;
    stdout.flush().map_err(CliError::WriteOutput)?;
    Ok(())
}

fn log_resolution(result: &ResolutionResult) {
    if !result.stale_broadcast_user_keys.is_empty() {
        tracing::info!(
            "Ignored stale broadcast signals from {:?}",
            result.stale_broadcast_user_keys
        );
    }

    if let Some(canonical) = &result.canonical_candidate {
        tracing::info!(
            "Canonical presenter: {} ({}) granted at {}",
            canonical.name,
            canonical.user_key,
            timestamp_to_rfc3339(canonical.grant_ts).unwrap_or_else(|| canonical.grant_ts.to_string())
        );
    } else if let Some(reason) = result.unresolved_reason {
        tracing::warn!(
            "Presenter conflict among {:?}: {}",
            result.active_user_keys,
            reason
        );
    } else if let Some(only) = result.sole_candidate() {
        tracing::info!("Sole presenter candidate: {} ({})", only.name, only.user_key);
    } else {
        tracing::info!("No presenter candidates");
    }
}
