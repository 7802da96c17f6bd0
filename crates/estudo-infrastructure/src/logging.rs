//! Tracing subscriber setup.

use crate::config::LoggingConfig;
use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Builds the filter: `RUST_LOG` wins, then the configured directive.
pub fn env_filter(config: &LoggingConfig) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.filter)
            .with_context(|| format!("Invalid log filter '{}'", config.filter)),
    }
}

/// Installs the global subscriber: filter, fmt output and an optional extra
/// layer (typically `GenerationEventLayer`).
///
/// Fails if a global subscriber is already set.
pub fn init_tracing<L>(config: &LoggingConfig, extra: Option<L>) -> anyhow::Result<()>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    let filter = env_filter(config)?;

    tracing_subscriber::registry()
        .with(extra)
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!("[Logging] Initialized with filter '{}'", config.filter);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_directive_is_rejected() {
        // Only meaningful when RUST_LOG does not override the directive.
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            filter: "estudo=notalevel".into(),
        };
        assert!(env_filter(&config).is_err());
    }

    #[test]
    fn test_default_directive_parses() {
        assert!(env_filter(&LoggingConfig::default()).is_ok());
    }
}
