//! Capabilities the core consumes from external collaborators.
//!
//! The LLM transport, the note tree and the artifact sink live outside this
//! workspace's core; these traits are the seams they plug into.

use super::request::PromptPayload;
use super::structured::StructuredPrompt;
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// An in-order stream of text fragments. `Err` items terminate the stream.
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Streaming text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Starts a generation and returns its fragment stream.
    ///
    /// The implementation is responsible for in-order, exactly-once delivery.
    async fn generate_stream(&self, prompt: PromptPayload) -> Result<FragmentStream>;
}

/// One-shot structured generation.
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    /// Returns the parsed JSON object, or `Value::Null` when nothing parseable came back.
    async fn generate_structured(&self, prompt: StructuredPrompt) -> Result<serde_json::Value>;
}

/// Read access to source notes.
#[async_trait]
pub trait NoteReader: Send + Sync {
    async fn read_note_bytes(&self, note_id: &str) -> Result<Vec<u8>>;
}

/// Write access for finished artifacts.
#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    /// Writes `content` to `<parent_segments>/<folder_name>/<file_name>`,
    /// creating missing folders.
    async fn write_file(
        &self,
        parent_segments: &[String],
        folder_name: &str,
        file_name: &str,
        content: &str,
    ) -> Result<()>;
}
