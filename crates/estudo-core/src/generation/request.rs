//! Generation requests, one variant per study mode.
//!
//! Prompt construction is left to the generator implementation; the
//! controller only needs to know where a request streams to and what phase
//! follows it.

use super::structured::LessonPlan;
use crate::artifact::ArtifactCategory;
use crate::session::{GeneratedDocument, Message, MessageRole, PendingEntry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRequest {
    pub title: String,
    #[serde(default)]
    pub plan: Option<LessonPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewRequest {
    /// The challenge the interview is about.
    pub challenge: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbookRequest {
    pub title: String,
    /// Exercise statements to solve.
    pub exercises: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeReviewRequest {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSpecRequest {
    pub title: String,
    #[serde(default)]
    pub requirements: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomChallengeRequest {
    pub title: String,
    pub description: String,
}

/// A generation request tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum GenerationRequest {
    Lesson(LessonRequest),
    Interview(InterviewRequest),
    Workbook(WorkbookRequest),
    ChallengeReview(ChallengeReviewRequest),
    ProjectSpec(ProjectSpecRequest),
    CustomChallenge(CustomChallengeRequest),
}

impl GenerationRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationRequest::Lesson(_) => "lesson",
            GenerationRequest::Interview(_) => "interview",
            GenerationRequest::Workbook(_) => "workbook",
            GenerationRequest::ChallengeReview(_) => "challenge_review",
            GenerationRequest::ProjectSpec(_) => "project_spec",
            GenerationRequest::CustomChallenge(_) => "custom_challenge",
        }
    }

    /// Document category, or `None` for conversational requests.
    pub fn category(&self) -> Option<ArtifactCategory> {
        match self {
            GenerationRequest::Lesson(_) => Some(ArtifactCategory::Lesson),
            GenerationRequest::Interview(_) => None,
            GenerationRequest::Workbook(_) => Some(ArtifactCategory::ExerciseSolution),
            GenerationRequest::ChallengeReview(_) => Some(ArtifactCategory::InterviewSummary),
            GenerationRequest::ProjectSpec(_) => Some(ArtifactCategory::ProjectSpec),
            GenerationRequest::CustomChallenge(_) => Some(ArtifactCategory::CustomChallenge),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            GenerationRequest::Lesson(r) => Some(&r.title),
            GenerationRequest::Interview(_) => None,
            GenerationRequest::Workbook(r) => Some(&r.title),
            GenerationRequest::ChallengeReview(r) => Some(&r.title),
            GenerationRequest::ProjectSpec(r) => Some(&r.title),
            GenerationRequest::CustomChallenge(r) => Some(&r.title),
        }
    }

    /// Whether the session waits for another user turn once this completes.
    pub fn awaits_user(&self) -> bool {
        matches!(
            self,
            GenerationRequest::Interview(_) | GenerationRequest::CustomChallenge(_)
        )
    }

    /// Builds the empty entry this request will stream into.
    pub fn pending_entry(&self, entry_id: impl Into<String>) -> PendingEntry {
        match (self.category(), self.title()) {
            (Some(category), Some(title)) => {
                PendingEntry::Document(GeneratedDocument::streaming(entry_id, category, title))
            }
            _ => PendingEntry::Message(Message::streaming(entry_id, MessageRole::Initiator)),
        }
    }
}

/// One prior turn handed to the generator as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: MessageRole,
    pub text: String,
}

/// Everything a generator needs to build its prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPayload {
    pub note_id: String,
    pub note_text: String,
    pub request: GenerationRequest,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interview_streams_into_a_message() {
        let request = GenerationRequest::Interview(InterviewRequest {
            challenge: "Projetar um rate limiter".into(),
        });
        match request.pending_entry("m1") {
            PendingEntry::Message(m) => {
                assert_eq!(m.id, "m1");
                assert_eq!(m.role, MessageRole::Initiator);
            }
            other => panic!("expected message target, got {other:?}"),
        }
        assert!(request.awaits_user());
    }

    #[test]
    fn test_workbook_streams_into_a_solution_document() {
        let request = GenerationRequest::Workbook(WorkbookRequest {
            title: "Lista 1".into(),
            exercises: "1) ...".into(),
        });
        match request.pending_entry("d1") {
            PendingEntry::Document(d) => {
                assert_eq!(d.category, ArtifactCategory::ExerciseSolution);
                assert_eq!(d.source_title, "Lista 1");
            }
            other => panic!("expected document target, got {other:?}"),
        }
        assert!(!request.awaits_user());
    }

    #[test]
    fn test_request_is_tagged_by_kind() {
        let request = GenerationRequest::ProjectSpec(ProjectSpecRequest {
            title: "Kanban".into(),
            requirements: None,
        });
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["kind"], "project_spec");
        assert_eq!(json["payload"]["title"], "Kanban");
    }
}
