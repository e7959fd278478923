//! Log output for the CLI
//!
//! Installs a `tracing` subscriber on stderr. Records the core crate emits
//! through the `log` facade are bridged into it.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
fn default_filter(trace: bool) -> &'static str {
    if trace {
        "info,dining::trace=debug"
    } else {
        "info"
    }
}

/// Initialize logging; `trace` turns on per-event philosopher tracing
pub fn init(trace: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(trace)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
