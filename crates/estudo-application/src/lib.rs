//! Application layer for Estudo.
//!
//! This crate provides use case implementations that coordinate the domain,
//! the generation controller and the persistence gateway.

pub mod bootstrap;
pub mod persistence;
pub mod session;
pub mod study_usecase;

pub use persistence::{PersistenceGateway, SaveResult};
pub use session::TabSessionCache;
pub use study_usecase::StudySessionUseCase;
