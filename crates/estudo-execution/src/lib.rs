//! Generation execution for Estudo.
//!
//! Owns the live [`SessionHandle`] type, the [`GenerationController`] that
//! drives fragment streams into sessions, and the tracing layer that turns
//! generation lifecycle logs into front-end events.

pub mod controller;
pub mod handle;
pub mod tracing_layer;

pub use controller::{
    ControllerSettings, GenerationController, GenerationOutcome, GenerationStatus,
    GenerationTicket,
};
pub use handle::SessionHandle;
pub use tracing_layer::{GenerationEvent, GenerationEventLayer};
