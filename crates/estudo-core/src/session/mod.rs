//! Session domain module.
//!
//! # Module Structure
//!
//! - `key`: study modes and the `(note, mode)` session key
//! - `message`: conversation turns (`Message`, `MessageRole`, `Attachment`)
//! - `document`: streamed documents (`GeneratedDocument`)
//! - `phase`: the per-session state machine (`SessionPhase`)
//! - `upsert`: the create-once / append-many / freeze-once protocol
//! - `model`: the `Session` aggregate and its generation bookkeeping

mod document;
mod key;
mod message;
mod model;
mod phase;
pub mod upsert;

pub use document::GeneratedDocument;
pub use key::{SessionKey, StudyMode};
pub use message::{Attachment, AttachmentKind, Message, MessageRole};
pub use model::{
    ActiveGeneration, FragmentOutcome, GenerationEnd, GenerationId, PendingEntry, Session,
};
pub use phase::SessionPhase;
pub use upsert::{StreamingEntry, UpsertOutcome};
