//! Generation requests and the capabilities that serve them.

pub mod ports;
mod request;
mod structured;

/// Prefix of the note appended to visible text when a stream fails.
pub const DEFAULT_DIAGNOSTIC_PREFIX: &str = "⚠️ Generation interrupted";

pub use ports::{ArtifactWriter, FragmentStream, NoteReader, StructuredGenerator, TextGenerator};
pub use request::{
    ChallengeReviewRequest, CustomChallengeRequest, GenerationRequest, HistoryTurn,
    InterviewRequest, LessonRequest, ProjectSpecRequest, PromptPayload, WorkbookRequest,
};
pub use structured::{
    ChallengeAlternatives, ChallengeOption, LessonPlan, LessonSection, StructuredOutput,
    StructuredPrompt,
};
