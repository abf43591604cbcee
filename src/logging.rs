//! Diagnostics go to stderr so stdout stays reserved for the plugin output.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "error";

/// Installs the global subscriber. The level is taken from `RUST_LOG`, defaulting to `error`.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("logger initialization failed: {}", error);
    }
}
