//! Conversation message types.

use serde::{Deserialize, Serialize};

/// Who produced a message.
///
/// The initiator is the side driving the study mode (the interviewer, the
/// model); the respondent is the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    Initiator,
    Respondent,
}

/// Kind of media attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Audio,
}

/// A resolved image or audio reference. Set once when the message is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    /// Opaque reference understood by the capture collaborator (path, data URL, ...).
    pub reference: String,
}

/// One turn of a streamed conversation.
///
/// `text` only grows while the owning generation is in flight and is frozen
/// once `finalized` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
    #[serde(default)]
    pub attachment: Option<Attachment>,
    /// Timestamp when the message was created (ISO 8601 format).
    pub created_at: String,
    #[serde(default)]
    pub finalized: bool,
}

impl Message {
    /// Creates an empty message that will receive streamed fragments.
    pub fn streaming(id: impl Into<String>, role: MessageRole) -> Self {
        Self {
            id: id.into(),
            role,
            text: String::new(),
            attachment: None,
            created_at: chrono::Utc::now().to_rfc3339(),
            finalized: false,
        }
    }

    /// Creates a complete user turn. It never receives fragments.
    pub fn user_turn(
        id: impl Into<String>,
        text: impl Into<String>,
        attachment: Option<Attachment>,
    ) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::Respondent,
            text: text.into(),
            attachment,
            created_at: chrono::Utc::now().to_rfc3339(),
            finalized: true,
        }
    }
}
