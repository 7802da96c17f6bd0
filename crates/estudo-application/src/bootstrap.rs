//! Wiring from `EstudoConfig` to the runtime components.

use crate::persistence::PersistenceGateway;
use estudo_execution::ControllerSettings;
use estudo_infrastructure::{ArtifactsConfig, GenerationConfig};

/// Controller settings for the configured watchdog and diagnostic prefix.
pub fn controller_settings(config: &GenerationConfig) -> ControllerSettings {
    ControllerSettings {
        idle_timeout: config.idle_timeout(),
        diagnostic_prefix: config.diagnostic_prefix.clone(),
    }
}

/// Gateway truncating filenames to the configured length.
pub fn persistence_gateway(config: &ArtifactsConfig) -> PersistenceGateway {
    PersistenceGateway::new(config.max_filename_len)
}
