use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{PoetryError, Result};

/// Install the global subscriber. Logs go to stderr so they never interleave
/// with the menus on stdout.
///
/// `RUST_LOG` wins over `default_filter` when set.
pub fn init_logging(default_filter: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(env_filter)
        .try_init()
        .map_err(|e| PoetryError::config(format!("Failed to initialize logging: {e}")))?;

    Ok(())
}
