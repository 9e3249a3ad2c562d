use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::{Error, Result};

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "repo_gateway=info,repo_mcp=info,repo_core=info,\
repo_tools=info,repo_discovery=info,repo_meta=info,repo_fs=info";

/// Install the global subscriber.
///
/// Output goes to stderr; stdout carries the protocol.
pub fn init() -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .map_err(|e| Error::Logging(e.to_string()))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_logging_init() {
        // only the first init in a process succeeds
        let _ = init();
        tracing::info!("logging initialized");
    }
}
