//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over the level derived from `--verbose` / `--quiet`.
//! Logs go to stderr so stdout stays clean for `--json`.

use anyhow::Context;
use anyhow::Result;
use std::fs::File;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initializes the global subscriber.
pub fn init(verbose: bool, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose, quiet)))
        .context("failed to create log filter")?;

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file '{}'", path.display()))?;
            let layer = fmt::layer()
                .with_writer(file)
                .with_target(true)
                .with_thread_names(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_ansi(false);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(layer)
                .try_init()
                .context("failed to install log subscriber")?;
        }
        None => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact();
            tracing_subscriber::registry()
                .with(env_filter)
                .with(layer)
                .try_init()
                .context("failed to install log subscriber")?;
        }
    }

    Ok(())
}

fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "dias=debug,dias_core=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true, false), "dias=debug,dias_core=debug");
        assert_eq!(default_directive(false, true), "error");
        assert_eq!(default_directive(false, false), "warn");
    }
}
