// ABOUTME: Logging setup for the ca-client binary
// ABOUTME: Diagnostics go to stderr so stdout stays readable for the operator

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Picks the default level. WARN normally, DEBUG with `--verbose`.
pub fn default_level(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

/// Standard logging to stderr. RUST_LOG directives are applied on top of the default level.
pub fn init(verbose: bool) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(default_level(verbose).into()),
        )
        .init();
}
