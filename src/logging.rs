//! Tracing subscriber setup for binaries and examples embedding the crate.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`, falling back
/// to `default_filter` (e.g. `"info"` or `"label_forge=debug"`).
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(default_filter: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails_without_panicking() {
        let _ = init_tracing("debug");
        assert!(init_tracing("info").is_err());
    }
}
