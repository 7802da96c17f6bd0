//! Study session use case.
//!
//! `StudySessionUseCase` is what the UI talks to: it resolves tabs to live
//! sessions, reads the source note before a generation, hands generations
//! to the controller and saves finished artifacts.

use crate::bootstrap;
use crate::persistence::{PersistenceGateway, SaveResult};
use crate::session::TabSessionCache;
use estudo_core::artifact::ArtifactCategory;
use estudo_core::error::{EstudoError, Result};
use estudo_core::generation::{
    ArtifactWriter, ChallengeAlternatives, GenerationRequest, HistoryTurn, LessonPlan,
    NoteReader, PromptPayload, StructuredGenerator, StructuredOutput, StructuredPrompt,
    TextGenerator,
};
use estudo_core::session::{Attachment, Message, SessionKey, StudyMode};
use estudo_execution::{GenerationController, GenerationTicket, SessionHandle};
use estudo_infrastructure::{EstudoConfig, FileSystemVault};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Use case for study sessions bound to notes.
///
/// # Responsibilities
///
/// - Opening and resuming per-tab sessions
/// - Building prompts from the note content and conversation history
/// - Starting and cancelling generations
/// - Structured one-shot requests (lesson plans, challenge alternatives)
/// - Saving finished artifacts next to the note
/// - Dropping sessions when their note goes away
pub struct StudySessionUseCase {
    /// Live sessions per tab
    cache: Arc<TabSessionCache>,
    /// Runs streaming generations
    controller: Arc<GenerationController>,
    /// Source note access
    note_reader: Arc<dyn NoteReader>,
    /// One-shot structured generation
    structured_generator: Arc<dyn StructuredGenerator>,
    /// Writes finished artifacts
    gateway: PersistenceGateway,
    /// Directory capability; absent until the user picks a folder
    artifact_writer: RwLock<Option<Arc<dyn ArtifactWriter>>>,
}

impl StudySessionUseCase {
    pub fn new(
        cache: Arc<TabSessionCache>,
        controller: Arc<GenerationController>,
        note_reader: Arc<dyn NoteReader>,
        structured_generator: Arc<dyn StructuredGenerator>,
        gateway: PersistenceGateway,
    ) -> Self {
        Self {
            cache,
            controller,
            note_reader,
            structured_generator,
            gateway,
            artifact_writer: RwLock::new(None),
        }
    }

    /// Builds the use case from configuration.
    ///
    /// Generation settings go to the controller and artifact settings to the
    /// gateway. A configured `vault_root` becomes the artifact directory.
    pub fn from_config(
        config: &EstudoConfig,
        generator: Arc<dyn TextGenerator>,
        note_reader: Arc<dyn NoteReader>,
        structured_generator: Arc<dyn StructuredGenerator>,
    ) -> Self {
        let controller = GenerationController::with_settings(
            generator,
            bootstrap::controller_settings(&config.generation),
        );
        let mut usecase = Self::new(
            Arc::new(TabSessionCache::new()),
            Arc::new(controller),
            note_reader,
            structured_generator,
            bootstrap::persistence_gateway(&config.artifacts),
        );
        if let Some(root) = &config.vault_root {
            let vault: Arc<dyn ArtifactWriter> = Arc::new(FileSystemVault::new(root));
            usecase.artifact_writer = RwLock::new(Some(vault));
        }
        usecase
    }

    /// Sets (or clears) the directory capability used for saving.
    pub async fn set_artifact_writer(&self, writer: Option<Arc<dyn ArtifactWriter>>) {
        *self.artifact_writer.write().await = writer;
    }

    /// Returns the tab's live session, creating it on first open.
    pub async fn open_or_resume_session(
        &self,
        note_id: &str,
        mode: StudyMode,
    ) -> Arc<SessionHandle> {
        let key = SessionKey::new(note_id, mode);
        let handle = self.cache.get_or_create(&key).await;
        tracing::debug!(
            "[StudySessionUseCase] Opened '{}' (phase: {})",
            key,
            handle.read().await.phase()
        );
        handle
    }

    async fn session(&self, key: &SessionKey) -> Result<Arc<SessionHandle>> {
        self.cache
            .get(key)
            .await
            .ok_or_else(|| EstudoError::not_found("Session", key.to_string()))
    }

    /// Commits a `selecting` session to its chosen challenge or plan.
    pub async fn commit_session(&self, key: &SessionKey) -> Result<()> {
        let handle = self.session(key).await?;
        handle.update(|s| s.commit()).await
    }

    /// Sends the session back to challenge selection.
    pub async fn reselect(&self, key: &SessionKey) -> Result<()> {
        let handle = self.session(key).await?;
        handle.update(|s| s.reselect()).await
    }

    /// Wipes the tab's conversation and documents, keeping the tab open.
    ///
    /// # Errors
    ///
    /// `AlreadyGenerating` while a generation is in flight.
    pub async fn reset_session(&self, key: &SessionKey) -> Result<()> {
        let handle = self.session(key).await?;
        handle.update(|s| s.clear()).await
    }

    /// Appends the learner's turn. Returns the new message id.
    ///
    /// # Errors
    ///
    /// `AlreadyGenerating` while a generation is in flight.
    pub async fn submit_user_turn(
        &self,
        key: &SessionKey,
        text: &str,
        attachment: Option<Attachment>,
    ) -> Result<String> {
        let handle = self.session(key).await?;
        let id = uuid::Uuid::new_v4().to_string();
        let message = Message::user_turn(id.clone(), text, attachment);

        handle
            .update(|s| {
                if s.is_generating() {
                    return Err(EstudoError::already_generating(s.key().to_string()));
                }
                s.push_message(message)
            })
            .await?;
        Ok(id)
    }

    /// Reads the note and starts a generation for `request`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the tab was never opened
    /// - `AlreadyGenerating` if a generation is in flight (checked before
    ///   the note is read, and again when the generation registers)
    /// - the note reader's error if the note cannot be read; the session
    ///   is left unchanged
    pub async fn start_generation(
        &self,
        key: &SessionKey,
        request: GenerationRequest,
    ) -> Result<GenerationTicket> {
        let handle = self.session(key).await?;
        if handle.read().await.is_generating() {
            return Err(EstudoError::already_generating(key.to_string()));
        }

        let note_text = self.read_note_text(key.note_id()).await?;
        let history = handle
            .read()
            .await
            .messages()
            .iter()
            .map(|m| HistoryTurn {
                role: m.role,
                text: m.text.clone(),
            })
            .collect();

        let prompt = PromptPayload {
            note_id: key.note_id().to_string(),
            note_text,
            request,
            history,
        };
        self.controller.start_generation(&handle, prompt).await
    }

    /// Cancels the tab's generation. No-op if nothing is running.
    pub async fn cancel_generation(&self, key: &SessionKey) -> bool {
        match self.cache.get(key).await {
            Some(handle) => self.controller.cancel_generation(&handle).await,
            None => false,
        }
    }

    /// Asks for a lesson plan for the note.
    pub async fn plan_lesson(&self, key: &SessionKey) -> Result<LessonPlan> {
        let note_text = self.read_note_text(key.note_id()).await?;
        self.request_structured(StructuredPrompt::LessonPlan {
            note_id: key.note_id().to_string(),
            note_text,
        })
        .await
    }

    /// Asks for `count` challenge alternatives to pick from.
    pub async fn suggest_challenges(
        &self,
        key: &SessionKey,
        count: usize,
    ) -> Result<ChallengeAlternatives> {
        let note_text = self.read_note_text(key.note_id()).await?;
        self.request_structured(StructuredPrompt::ChallengeAlternatives {
            note_id: key.note_id().to_string(),
            note_text,
            count,
        })
        .await
    }

    /// Runs a structured request and parses it into `T`.
    ///
    /// Transport failures and unparseable output both surface as
    /// `StructuredGeneration` so the UI can offer a retry.
    pub async fn request_structured<T: StructuredOutput>(
        &self,
        prompt: StructuredPrompt,
    ) -> Result<T> {
        let value = self
            .structured_generator
            .generate_structured(prompt)
            .await
            .map_err(|e| match e {
                EstudoError::StructuredGeneration(_) => e,
                other => EstudoError::structured(format!("{}: {}", T::NAME, other)),
            })?;
        T::parse(value).inspect_err(|e| {
            tracing::warn!("[StudySessionUseCase] Structured generation unusable: {}", e);
        })
    }

    /// Saves `content` as an artifact of the tab's note.
    pub async fn save_artifact(
        &self,
        key: &SessionKey,
        category: ArtifactCategory,
        title: &str,
        content: &str,
    ) -> SaveResult {
        let writer = self.artifact_writer.read().await.clone();
        self.gateway
            .save(writer.as_deref(), key.note_id(), category, title, content)
            .await
    }

    /// Saves a finished generated document of the tab's session.
    ///
    /// # Errors
    ///
    /// `NotFound` if the session or document does not exist. A document that
    /// is still streaming is reported as a failed save.
    pub async fn save_document(&self, key: &SessionKey, document_id: &str) -> Result<SaveResult> {
        let handle = self.session(key).await?;
        let document = handle
            .read()
            .await
            .document(document_id)
            .cloned()
            .ok_or_else(|| EstudoError::not_found("GeneratedDocument", document_id))?;

        if !document.finalized {
            return Ok(SaveResult {
                success: false,
                file_name: None,
                location: None,
                error: Some("Document is still being generated".to_string()),
            });
        }

        Ok(self
            .save_artifact(key, document.category, &document.source_title, &document.text)
            .await)
    }

    /// Closes one tab, cancelling its generation.
    pub async fn close_session(&self, key: &SessionKey) -> bool {
        if let Some(handle) = self.cache.get(key).await {
            self.controller.cancel_generation(&handle).await;
        }
        self.cache.clear(key).await
    }

    /// Drops every session of a deleted or renamed note.
    ///
    /// # Returns
    ///
    /// The number of sessions removed.
    pub async fn forget_note(&self, note_id: &str) -> usize {
        let removed = self.cache.clear_all_for_note(note_id).await;
        for handle in &removed {
            self.controller.cancel_generation(handle).await;
        }
        tracing::info!(
            "[StudySessionUseCase] Forgot {} session(s) for '{}'",
            removed.len(),
            note_id
        );
        removed.len()
    }

    async fn read_note_text(&self, note_id: &str) -> Result<String> {
        let bytes = self.note_reader.read_note_bytes(note_id).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
