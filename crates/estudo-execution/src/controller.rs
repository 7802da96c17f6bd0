//! Generation controller.
//!
//! Runs one generation per session at a time: registers it on the session,
//! drives the fragment stream on a background task and routes every
//! fragment through the session's streaming upsert.

use crate::handle::SessionHandle;
use estudo_core::artifact::{ArtifactCategory, extract_answer_key};
use estudo_core::error::{EstudoError, Result};
use estudo_core::generation::{
    DEFAULT_DIAGNOSTIC_PREFIX, FragmentStream, PromptPayload, TextGenerator,
};
use estudo_core::session::{FragmentOutcome, GenerationEnd, GenerationId, SessionKey};
use futures::StreamExt;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Controller settings.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Cancel a generation when no fragment arrives for this long.
    pub idle_timeout: Option<Duration>,
    /// Prefix of the note appended to the visible text on stream failure.
    pub diagnostic_prefix: String,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            idle_timeout: None,
            diagnostic_prefix: DEFAULT_DIAGNOSTIC_PREFIX.to_string(),
        }
    }
}

/// How a generation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationStatus {
    Completed,
    Cancelled,
    Failed { message: String },
}

/// Final result handed back to the caller for post-processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationOutcome {
    pub generation_id: GenerationId,
    pub entry_id: String,
    pub status: GenerationStatus,
    /// The entry's frozen text.
    pub text: String,
    /// Option letters found in a completed exercise solution.
    pub answer_key: Vec<char>,
}

/// A started generation.
#[derive(Debug)]
pub struct GenerationTicket {
    pub generation_id: GenerationId,
    pub entry_id: String,
    join: JoinHandle<GenerationOutcome>,
}

impl GenerationTicket {
    /// Waits for the generation to complete, fail or be cancelled.
    pub async fn wait(self) -> Result<GenerationOutcome> {
        self.join
            .await
            .map_err(|e| EstudoError::internal(format!("generation task failed: {}", e)))
    }
}

struct InFlight {
    generation_id: GenerationId,
    token: CancellationToken,
}

type InFlightMap = Arc<Mutex<HashMap<SessionKey, InFlight>>>;

/// Orchestrates generations against a streaming text generator.
pub struct GenerationController {
    generator: Arc<dyn TextGenerator>,
    in_flight: InFlightMap,
    settings: ControllerSettings,
}

impl GenerationController {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self::with_settings(generator, ControllerSettings::default())
    }

    pub fn with_settings(generator: Arc<dyn TextGenerator>, settings: ControllerSettings) -> Self {
        Self {
            generator,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            settings,
        }
    }

    /// Starts a generation for `prompt.request` on the given session.
    ///
    /// # Errors
    ///
    /// - `AlreadyGenerating` if the session has a generation in flight; the
    ///   session is left untouched.
    /// - `InvalidTransition` if the session is still `selecting`.
    pub async fn start_generation(
        &self,
        handle: &Arc<SessionHandle>,
        prompt: PromptPayload,
    ) -> Result<GenerationTicket> {
        let entry_id = uuid::Uuid::new_v4().to_string();
        let target = prompt.request.pending_entry(entry_id.clone());
        let awaiting_user = prompt.request.awaits_user();
        let category = prompt.request.category();
        let key = handle.key().clone();

        // Registration and token insert happen under one `in_flight` lock so a
        // concurrent cancel either sees nothing to cancel or finds the token.
        // Lock order is always `in_flight` then session.
        let mut in_flight = self.in_flight.lock().await;
        let generation_id = match handle.update(|s| s.begin_generation(target)).await {
            Ok(id) => id,
            Err(e) => {
                drop(in_flight);
                tracing::info!(
                    target: "generation",
                    session_key = %key,
                    status = "rejected",
                    "[GenerationController] Start rejected: {}",
                    e
                );
                return Err(e);
            }
        };

        let token = CancellationToken::new();
        in_flight.insert(
            key.clone(),
            InFlight {
                generation_id: generation_id.clone(),
                token: token.clone(),
            },
        );
        drop(in_flight);

        tracing::info!(
            target: "generation",
            session_key = %key,
            generation_id = %generation_id,
            kind = prompt.request.kind(),
            status = "started",
            "[GenerationController] Generation started"
        );

        let run = GenerationRun {
            generator: self.generator.clone(),
            handle: handle.clone(),
            in_flight: self.in_flight.clone(),
            settings: self.settings.clone(),
            generation_id: generation_id.clone(),
            entry_id: entry_id.clone(),
            awaiting_user,
            category,
            token,
        };
        let join = tokio::spawn(run.drive(prompt));

        Ok(GenerationTicket {
            generation_id,
            entry_id,
            join,
        })
    }

    /// Stops the session's in-flight generation.
    ///
    /// The partial entry is kept and frozen, the phase becomes `idle`. Any
    /// fragment still arriving for the cancelled generation is dropped.
    /// Returns `false` (and does nothing) if no generation was in flight.
    pub async fn cancel_generation(&self, handle: &SessionHandle) -> bool {
        cancel_in_flight(&self.in_flight, handle, "cancelled").await
    }

    /// Routes a single fragment for `generation_id` into the session.
    ///
    /// Fragments for anything but the active generation are dropped;
    /// fragments for a finalized entry are logged and ignored.
    pub async fn apply_fragment(
        &self,
        handle: &SessionHandle,
        generation_id: &GenerationId,
        fragment: &str,
    ) -> FragmentOutcome {
        apply_fragment(handle, generation_id, fragment).await
    }

    pub async fn is_generating(&self, key: &SessionKey) -> bool {
        self.in_flight.lock().await.contains_key(key)
    }
}

async fn apply_fragment(
    handle: &SessionHandle,
    generation_id: &GenerationId,
    fragment: &str,
) -> FragmentOutcome {
    match handle
        .update(|s| s.apply_fragment(generation_id, fragment))
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(
                session_key = %handle.key(),
                generation_id = %generation_id,
                "[GenerationController] Ignoring fragment: {}",
                e
            );
            FragmentOutcome::Dropped
        }
    }
}

async fn cancel_in_flight(in_flight: &InFlightMap, handle: &SessionHandle, reason: &str) -> bool {
    // Held across the session update so a concurrent start cannot register
    // between the token removal and the finish.
    let mut in_flight = in_flight.lock().await;
    let entry = in_flight.remove(handle.key());

    let finished = handle
        .update(|s| {
            let generation_id = s.active_generation_id().cloned()?;
            s.finish_generation(&generation_id, GenerationEnd::Cancelled)
                .map(|_| generation_id)
        })
        .await;
    drop(in_flight);

    if let Some(entry) = &entry {
        entry.token.cancel();
    }

    match finished {
        Some(generation_id) => {
            tracing::info!(
                target: "generation",
                session_key = %handle.key(),
                generation_id = %generation_id,
                status = reason,
                "[GenerationController] Generation {}",
                reason
            );
            true
        }
        None => false,
    }
}

enum Step {
    Fragment(String),
    End,
    Failed(EstudoError),
    IdleTimeout,
    Cancelled,
}

struct GenerationRun {
    generator: Arc<dyn TextGenerator>,
    handle: Arc<SessionHandle>,
    in_flight: InFlightMap,
    settings: ControllerSettings,
    generation_id: GenerationId,
    entry_id: String,
    awaiting_user: bool,
    category: Option<ArtifactCategory>,
    token: CancellationToken,
}

impl GenerationRun {
    async fn drive(self, prompt: PromptPayload) -> GenerationOutcome {
        let opened = tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            stream = self.generator.generate_stream(prompt) => Some(stream),
        };

        let status = match opened {
            None => GenerationStatus::Cancelled,
            Some(Err(e)) => self.fail(e).await,
            Some(Ok(stream)) => self.consume(stream).await,
        };

        self.release().await;

        let text = self
            .handle
            .read()
            .await
            .entry_text(&self.entry_id)
            .unwrap_or_default()
            .to_string();
        let answer_key = match (&status, self.category) {
            (GenerationStatus::Completed, Some(ArtifactCategory::ExerciseSolution)) => {
                extract_answer_key(&text)
            }
            _ => Vec::new(),
        };

        GenerationOutcome {
            generation_id: self.generation_id,
            entry_id: self.entry_id,
            status,
            text,
            answer_key,
        }
    }

    async fn consume(&self, mut stream: FragmentStream) -> GenerationStatus {
        loop {
            let step = tokio::select! {
                biased;
                _ = self.token.cancelled() => Step::Cancelled,
                step = next_step(&mut stream, self.settings.idle_timeout) => step,
            };

            match step {
                Step::Fragment(fragment) => {
                    if self.token.is_cancelled() {
                        return GenerationStatus::Cancelled;
                    }
                    let outcome = apply_fragment(&self.handle, &self.generation_id, &fragment).await;
                    if outcome == FragmentOutcome::Dropped
                        && self.handle.read().await.active_generation_id() != Some(&self.generation_id)
                    {
                        // Cancelled between receiving and applying.
                        return GenerationStatus::Cancelled;
                    }
                }
                Step::End => return self.complete().await,
                Step::Failed(e) => return self.fail(e).await,
                Step::IdleTimeout => {
                    tracing::warn!(
                        session_key = %self.handle.key(),
                        generation_id = %self.generation_id,
                        "[GenerationController] No fragment within {:?}, cancelling",
                        self.settings.idle_timeout
                    );
                    cancel_in_flight(&self.in_flight, &self.handle, "timed_out").await;
                    return GenerationStatus::Cancelled;
                }
                Step::Cancelled => return GenerationStatus::Cancelled,
            }
        }
    }

    async fn complete(&self) -> GenerationStatus {
        let end = GenerationEnd::Completed {
            awaiting_user: self.awaiting_user,
        };
        let finished = self
            .handle
            .update(|s| s.finish_generation(&self.generation_id, end))
            .await;
        if finished.is_none() {
            return GenerationStatus::Cancelled;
        }
        tracing::info!(
            target: "generation",
            session_key = %self.handle.key(),
            generation_id = %self.generation_id,
            status = "completed",
            "[GenerationController] Generation completed"
        );
        GenerationStatus::Completed
    }

    async fn fail(&self, error: EstudoError) -> GenerationStatus {
        let message = error.to_string();
        let diagnostic = format!("{}: {}", self.settings.diagnostic_prefix, message);
        let finished = self
            .handle
            .update(|s| s.finish_generation(&self.generation_id, GenerationEnd::Failed { diagnostic }))
            .await;
        if finished.is_none() {
            return GenerationStatus::Cancelled;
        }
        tracing::error!(
            target: "generation",
            session_key = %self.handle.key(),
            generation_id = %self.generation_id,
            status = "failed",
            "[GenerationController] Generation failed: {}",
            message
        );
        GenerationStatus::Failed { message }
    }

    /// Drops this run's in-flight entry unless a newer generation replaced it.
    async fn release(&self) {
        let mut in_flight = self.in_flight.lock().await;
        if in_flight
            .get(self.handle.key())
            .is_some_and(|entry| entry.generation_id == self.generation_id)
        {
            in_flight.remove(self.handle.key());
        }
    }
}

async fn next_step(stream: &mut FragmentStream, idle_timeout: Option<Duration>) -> Step {
    let next = match idle_timeout {
        Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
            Ok(next) => next,
            Err(_) => return Step::IdleTimeout,
        },
        None => stream.next().await,
    };
    match next {
        Some(Ok(fragment)) => Step::Fragment(fragment),
        Some(Err(e)) => Step::Failed(e),
        None => Step::End,
    }
}
