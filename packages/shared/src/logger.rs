//! Logging setup utilities for Podium binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Filters are set for both the calling package and the binary itself; `RUST_LOG`
/// overrides them. Output goes to stderr so binaries can keep stdout for their results.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "podium-resolve")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use podium_shared::logger::setup_logger;
///
/// setup_logger("podium-resolve", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    format!(
        "podium_authority={},podium_shared={},{}={}",
        default_log_level,
        default_log_level,
        binary_name.replace('-', "_"),
        default_log_level
    )
}
