//! Infrastructure layer for Estudo.
//!
//! Filesystem-backed capabilities (note reading, artifact writing), the
//! TOML configuration file and tracing setup.

pub mod config;
pub mod logging;
pub mod paths;
pub mod vault;

pub use config::{ArtifactsConfig, EstudoConfig, GenerationConfig, LoggingConfig};
pub use paths::EstudoPaths;
pub use vault::FileSystemVault;
