//! Session domain model.
//!
//! A `Session` is the in-memory state of one (note, study mode) tab. It owns
//! the ordered conversation and document lists and the bookkeeping for the
//! one generation that may be in flight.

use super::document::GeneratedDocument;
use super::key::{SessionKey, StudyMode};
use super::message::Message;
use super::phase::SessionPhase;
use super::upsert::{self, UpsertOutcome};
use crate::error::{EstudoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one generation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationId(String);

impl GenerationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GenerationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The entry a generation streams into, prepared before any fragment arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "entry", rename_all = "snake_case")]
pub enum PendingEntry {
    Message(Message),
    Document(GeneratedDocument),
}

impl PendingEntry {
    pub fn id(&self) -> &str {
        match self {
            PendingEntry::Message(m) => &m.id,
            PendingEntry::Document(d) => &d.id,
        }
    }
}

/// Bookkeeping for the generation currently in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveGeneration {
    pub generation_id: GenerationId,
    pub target: PendingEntry,
}

/// How a generation ended, as applied to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEnd {
    /// End-of-stream. `awaiting_user` selects `active` over `idle`.
    Completed { awaiting_user: bool },
    /// Stopped on request; partial text is kept as-is.
    Cancelled,
    /// The stream failed; `diagnostic` is appended to the visible text.
    Failed { diagnostic: String },
}

/// Result of routing one fragment into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentOutcome {
    Applied(UpsertOutcome),
    /// The fragment belongs to a generation that is no longer active.
    Dropped,
}

/// In-memory state for one (note, study mode) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    key: SessionKey,
    phase: SessionPhase,
    /// Chronological conversation turns.
    messages: Vec<Message>,
    /// Streamed documents in creation order.
    documents: Vec<GeneratedDocument>,
    active_generation: Option<ActiveGeneration>,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    /// Timestamp of the last mutation (ISO 8601 format)
    pub updated_at: String,
}

impl Session {
    /// Creates a fresh session for `note_id` in `mode`.
    ///
    /// Modes that pick a challenge first start in `selecting`; the rest start `active`.
    pub fn new(note_id: impl Into<String>, mode: StudyMode) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        let phase = if mode.requires_selection() {
            SessionPhase::Selecting
        } else {
            SessionPhase::Active
        };
        Self {
            key: SessionKey::new(note_id, mode),
            phase,
            messages: Vec::new(),
            documents: Vec::new(),
            active_generation: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn from_key(key: SessionKey) -> Self {
        let mode = key.mode();
        let note_id = key.note_id().to_string();
        Self::new(note_id, mode)
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn note_id(&self) -> &str {
        self.key.note_id()
    }

    pub fn mode(&self) -> StudyMode {
        self.key.mode()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn documents(&self) -> &[GeneratedDocument] {
        &self.documents
    }

    pub fn active_generation_id(&self) -> Option<&GenerationId> {
        self.active_generation.as_ref().map(|g| &g.generation_id)
    }

    pub fn is_generating(&self) -> bool {
        self.active_generation.is_some()
    }

    /// Id of the entry the in-flight generation streams into.
    pub fn streaming_entry_id(&self) -> Option<&str> {
        self.active_generation.as_ref().map(|g| g.target.id())
    }

    pub fn document(&self, id: &str) -> Option<&GeneratedDocument> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Text of any entry by id, message or document.
    pub fn entry_text(&self, id: &str) -> Option<&str> {
        self.message(id)
            .map(|m| m.text.as_str())
            .or_else(|| self.document(id).map(|d| d.text.as_str()))
    }

    fn contains_id(&self, id: &str) -> bool {
        self.message(id).is_some() || self.document(id).is_some()
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    fn transition(&mut self, next: SessionPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(EstudoError::InvalidTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        self.phase = next;
        self.touch();
        Ok(())
    }

    /// `selecting -> active`: the user committed to a challenge or plan.
    pub fn commit(&mut self) -> Result<()> {
        self.transition(SessionPhase::Active)
    }

    /// Goes back to choosing a challenge. Not allowed mid-generation.
    pub fn reselect(&mut self) -> Result<()> {
        if self.is_generating() {
            return Err(EstudoError::already_generating(self.key.to_string()));
        }
        self.transition(SessionPhase::Selecting)
    }

    /// Appends a complete message (a user turn or a system note).
    ///
    /// Fails with `DuplicateIdentifier` if the id is already used in this session.
    pub fn push_message(&mut self, message: Message) -> Result<()> {
        if self.contains_id(&message.id) {
            return Err(EstudoError::DuplicateIdentifier { id: message.id });
        }
        self.messages.push(message);
        self.touch();
        Ok(())
    }

    /// Registers a new in-flight generation streaming into `target`.
    pub fn begin_generation(&mut self, target: PendingEntry) -> Result<GenerationId> {
        if self.is_generating() {
            return Err(EstudoError::already_generating(self.key.to_string()));
        }
        if self.contains_id(target.id()) {
            return Err(EstudoError::DuplicateIdentifier {
                id: target.id().to_string(),
            });
        }
        self.transition(SessionPhase::Generating)?;

        let generation_id = GenerationId::new();
        self.active_generation = Some(ActiveGeneration {
            generation_id: generation_id.clone(),
            target,
        });
        Ok(generation_id)
    }

    /// Routes one fragment into the active generation's entry.
    ///
    /// Fragments tagged with any generation id other than the active one are
    /// dropped, which keeps a cancelled stream from touching its frozen entry.
    pub fn apply_fragment(
        &mut self,
        generation_id: &GenerationId,
        fragment: &str,
    ) -> Result<FragmentOutcome> {
        let Some(active) = self.active_generation.as_ref() else {
            return Ok(FragmentOutcome::Dropped);
        };
        if &active.generation_id != generation_id {
            return Ok(FragmentOutcome::Dropped);
        }

        let outcome = match &active.target {
            PendingEntry::Message(template) => {
                let id = template.id.clone();
                upsert::upsert_fragment(&mut self.messages, &id, fragment, || template.clone())?
            }
            PendingEntry::Document(template) => {
                let id = template.id.clone();
                upsert::upsert_fragment(&mut self.documents, &id, fragment, || {
                    template.clone()
                })?
            }
        };
        self.touch();
        Ok(FragmentOutcome::Applied(outcome))
    }

    /// Ends the active generation: freezes its entry, clears the in-flight
    /// id and moves the phase. Returns the entry's final text, or `None` if
    /// `generation_id` is not the active generation.
    pub fn finish_generation(
        &mut self,
        generation_id: &GenerationId,
        end: GenerationEnd,
    ) -> Option<String> {
        if self.active_generation_id() != Some(generation_id) {
            return None;
        }
        let active = self.active_generation.take()?;
        let id = active.target.id().to_string();

        // A stream that ended before its first fragment has no entry yet. A
        // completed one still gets an empty entry so the caller's id resolves;
        // a failed one gets the diagnostic as its whole text.
        let exists = self.contains_id(&id);
        let tail = match &end {
            GenerationEnd::Failed { diagnostic } if exists => Some(format!("\n\n{}", diagnostic)),
            GenerationEnd::Failed { diagnostic } => Some(diagnostic.clone()),
            GenerationEnd::Completed { .. } if !exists => Some(String::new()),
            _ => None,
        };
        if let Some(tail) = tail {
            let result = match &active.target {
                PendingEntry::Message(template) => {
                    upsert::upsert_fragment(&mut self.messages, &id, &tail, || template.clone())
                }
                PendingEntry::Document(template) => {
                    upsert::upsert_fragment(&mut self.documents, &id, &tail, || template.clone())
                }
            };
            if let Err(e) = result {
                tracing::warn!("[Session] Could not close entry '{}': {}", id, e);
            }
        }

        match &active.target {
            PendingEntry::Message(_) => upsert::finalize_entry(&mut self.messages, &id),
            PendingEntry::Document(_) => upsert::finalize_entry(&mut self.documents, &id),
        };

        self.phase = match end {
            GenerationEnd::Completed {
                awaiting_user: true,
            } => SessionPhase::Active,
            GenerationEnd::Completed {
                awaiting_user: false,
            }
            | GenerationEnd::Cancelled => SessionPhase::Idle,
            GenerationEnd::Failed { .. } => SessionPhase::Errored,
        };
        self.touch();

        Some(self.entry_text(&id).unwrap_or_default().to_string())
    }

    /// Drops all conversation and document state, keeping the key.
    ///
    /// Fails with `AlreadyGenerating` while a generation is in flight; cancel
    /// it first so its entry is frozen rather than silently discarded.
    pub fn clear(&mut self) -> Result<()> {
        if self.is_generating() {
            return Err(EstudoError::already_generating(self.key.to_string()));
        }
        let key = self.key.clone();
        *self = Self::from_key(key);
        Ok(())
    }
}
