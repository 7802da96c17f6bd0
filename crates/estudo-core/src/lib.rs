//! Domain layer for Estudo: study sessions, streamed artifacts and the
//! capabilities they are generated and persisted through.

pub mod artifact;
pub mod error;
pub mod generation;
pub mod session;

// Re-export common error type
pub use error::{EstudoError, Result};
