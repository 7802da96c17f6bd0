//! Artifact persistence.

mod gateway;

pub use gateway::{PersistenceGateway, SaveResult};
