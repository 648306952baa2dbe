//! Diagnostic output setup for the command-line binary

use crate::io::error::{Result, invalid_parameter};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Parse a level name such as `info` or `debug`
///
/// # Errors
///
/// Returns an error for names tracing does not recognise
pub fn parse_level(name: &str) -> Result<Level> {
    name.parse::<Level>().map_err(|e| {
        invalid_parameter("log-level", &name, &e)
    })
}

/// Install the global subscriber writing to stderr
///
/// A subscriber that is already installed (as in tests) is left in place.
pub fn init(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
