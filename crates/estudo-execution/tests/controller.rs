use async_trait::async_trait;
use estudo_core::error::{EstudoError, Result};
use estudo_core::generation::{
    FragmentStream, GenerationRequest, InterviewRequest, LessonRequest, PromptPayload,
    TextGenerator, WorkbookRequest,
};
use estudo_core::session::{FragmentOutcome, Session, SessionPhase, StudyMode};
use estudo_execution::{
    ControllerSettings, GenerationController, GenerationStatus, SessionHandle,
};
use futures::StreamExt;
use futures::channel::mpsc::{UnboundedSender, unbounded};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Hands out pre-built streams in order, one per generation.
struct ScriptedGenerator {
    streams: Mutex<VecDeque<Result<FragmentStream>>>,
}

impl ScriptedGenerator {
    fn new(streams: Vec<Result<FragmentStream>>) -> Arc<Self> {
        Arc::new(Self {
            streams: Mutex::new(streams.into()),
        })
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate_stream(&self, _prompt: PromptPayload) -> Result<FragmentStream> {
        self.streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(EstudoError::stream("no scripted stream left")))
    }
}

fn fixed(fragments: &[&str]) -> Result<FragmentStream> {
    let items: Vec<Result<String>> = fragments.iter().map(|f| Ok(f.to_string())).collect();
    Ok(futures::stream::iter(items).boxed())
}

fn manual() -> (UnboundedSender<Result<String>>, Result<FragmentStream>) {
    let (tx, rx) = unbounded();
    (tx, Ok(rx.boxed()))
}

fn lesson_prompt(title: &str) -> PromptPayload {
    PromptPayload {
        note_id: "Root/Topic/doc.md".into(),
        note_text: "conteúdo da nota".into(),
        request: GenerationRequest::Lesson(LessonRequest {
            title: title.into(),
            plan: None,
        }),
        history: Vec::new(),
    }
}

fn lesson_handle() -> Arc<SessionHandle> {
    Arc::new(SessionHandle::new(Session::new(
        "Root/Topic/doc.md",
        StudyMode::Lesson,
    )))
}

async fn wait_for_text(handle: &SessionHandle, entry_id: &str, expected: &str) {
    let mut changes = handle.subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if handle.read().await.entry_text(entry_id) == Some(expected) {
                return;
            }
            changes.changed().await.unwrap();
        }
    })
    .await
    .expect("text never reached expected value");
}

#[tokio::test]
async fn test_fragments_build_one_document() {
    let generator = ScriptedGenerator::new(vec![fixed(&["Aula ", "sobre ", "caches"])]);
    let controller = GenerationController::new(generator);
    let handle = lesson_handle();

    let ticket = controller
        .start_generation(&handle, lesson_prompt("Caches"))
        .await
        .unwrap();
    let outcome = ticket.wait().await.unwrap();

    assert_eq!(outcome.status, GenerationStatus::Completed);
    assert_eq!(outcome.text, "Aula sobre caches");

    let session = handle.snapshot().await;
    assert_eq!(session.documents().len(), 1);
    assert!(session.documents()[0].finalized);
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(session.active_generation_id().is_none());
    assert!(!controller.is_generating(handle.key()).await);
}

#[tokio::test]
async fn test_second_start_is_rejected_while_generating() {
    let (tx, stream) = manual();
    let generator = ScriptedGenerator::new(vec![stream, fixed(&["nunca"])]);
    let controller = GenerationController::new(generator);
    let handle = lesson_handle();

    let ticket = controller
        .start_generation(&handle, lesson_prompt("Primeira"))
        .await
        .unwrap();
    tx.unbounded_send(Ok("parte".into())).unwrap();
    wait_for_text(&handle, &ticket.entry_id, "parte").await;

    let before = handle.snapshot().await;
    let err = controller
        .start_generation(&handle, lesson_prompt("Segunda"))
        .await
        .err()
        .expect("second start must fail");

    assert!(err.is_already_generating());
    let after = handle.snapshot().await;
    assert_eq!(after.documents(), before.documents());
    assert_eq!(after.active_generation_id(), Some(&ticket.generation_id));

    drop(tx);
    let outcome = ticket.wait().await.unwrap();
    assert_eq!(outcome.text, "parte");
}

#[tokio::test]
async fn test_cancel_freezes_partial_text_and_drops_late_fragments() {
    let (tx, stream) = manual();
    let controller = GenerationController::new(ScriptedGenerator::new(vec![stream]));
    let handle = lesson_handle();

    let ticket = controller
        .start_generation(&handle, lesson_prompt("Filas"))
        .await
        .unwrap();
    let generation_id = ticket.generation_id.clone();
    let entry_id = ticket.entry_id.clone();

    tx.unbounded_send(Ok("um ".into())).unwrap();
    tx.unbounded_send(Ok("dois ".into())).unwrap();
    wait_for_text(&handle, &entry_id, "um dois ").await;

    assert!(controller.cancel_generation(&handle).await);

    for late in ["três ", "quatro ", "cinco"] {
        let _ = tx.unbounded_send(Ok(late.into()));
        let outcome = controller
            .apply_fragment(&handle, &generation_id, late)
            .await;
        assert_eq!(outcome, FragmentOutcome::Dropped);
    }

    let outcome = ticket.wait().await.unwrap();
    assert_eq!(outcome.status, GenerationStatus::Cancelled);
    assert_eq!(outcome.text, "um dois ");

    let session = handle.snapshot().await;
    assert_eq!(session.entry_text(&entry_id), Some("um dois "));
    assert!(session.documents()[0].finalized);
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(session.active_generation_id().is_none());
}

#[tokio::test]
async fn test_empty_stream_completes_with_empty_document() {
    let controller = GenerationController::new(ScriptedGenerator::new(vec![fixed(&[])]));
    let handle = lesson_handle();

    let ticket = controller
        .start_generation(&handle, lesson_prompt("Vazio"))
        .await
        .unwrap();
    let entry_id = ticket.entry_id.clone();
    let outcome = ticket.wait().await.unwrap();

    assert_eq!(outcome.status, GenerationStatus::Completed);
    assert_eq!(outcome.text, "");
    let session = handle.snapshot().await;
    let document = session.document(&entry_id).unwrap();
    assert!(document.finalized);
    assert_eq!(session.phase(), SessionPhase::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_racing_start_never_strands_a_generation() {
    for _ in 0..50 {
        let (_tx, stream) = manual();
        let controller = Arc::new(GenerationController::new(ScriptedGenerator::new(vec![
            stream,
        ])));
        let handle = lesson_handle();

        let starter = {
            let controller = controller.clone();
            let handle = handle.clone();
            tokio::spawn(async move {
                controller
                    .start_generation(&handle, lesson_prompt("Corrida"))
                    .await
            })
        };
        let canceller = {
            let controller = controller.clone();
            let handle = handle.clone();
            tokio::spawn(async move { controller.cancel_generation(&handle).await })
        };

        let ticket = starter.await.unwrap().unwrap();
        if !canceller.await.unwrap() {
            // Cancel ran before the start registered; cancel for real now.
            assert!(controller.cancel_generation(&handle).await);
        }

        let outcome = tokio::time::timeout(Duration::from_secs(5), ticket.wait())
            .await
            .expect("cancelled generation never finished")
            .unwrap();
        assert_eq!(outcome.status, GenerationStatus::Cancelled);
        assert!(!controller.is_generating(handle.key()).await);
        assert!(!handle.read().await.is_generating());
    }
}

#[tokio::test]
async fn test_cancel_without_generation_is_noop() {
    let controller = GenerationController::new(ScriptedGenerator::new(Vec::new()));
    let handle = lesson_handle();

    assert!(!controller.cancel_generation(&handle).await);
    assert!(!controller.cancel_generation(&handle).await);
    assert_eq!(handle.read().await.phase(), SessionPhase::Active);
}

#[tokio::test]
async fn test_stream_error_keeps_partial_text_and_allows_retry() {
    let failing: Result<FragmentStream> = Ok(futures::stream::iter(vec![
        Ok("metade".to_string()),
        Err(EstudoError::stream("conexão perdida")),
    ])
    .boxed());
    let generator = ScriptedGenerator::new(vec![failing, fixed(&["de novo"])]);
    let controller = GenerationController::new(generator);
    let handle = lesson_handle();

    let outcome = controller
        .start_generation(&handle, lesson_prompt("Redes"))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    match &outcome.status {
        GenerationStatus::Failed { message } => assert!(message.contains("conexão perdida")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(outcome.text.starts_with("metade\n\n⚠️ Generation interrupted"));
    assert_eq!(handle.read().await.phase(), SessionPhase::Errored);

    let retry = controller
        .start_generation(&handle, lesson_prompt("Redes"))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(retry.status, GenerationStatus::Completed);
    assert_eq!(handle.read().await.documents().len(), 2);
}

#[tokio::test]
async fn test_generator_refusing_to_start_marks_session_errored() {
    let generator = ScriptedGenerator::new(vec![Err(EstudoError::stream("401"))]);
    let controller = GenerationController::new(generator);
    let handle = lesson_handle();

    let outcome = controller
        .start_generation(&handle, lesson_prompt("Auth"))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert!(matches!(outcome.status, GenerationStatus::Failed { .. }));
    let session = handle.snapshot().await;
    assert_eq!(session.phase(), SessionPhase::Errored);
    assert_eq!(session.documents().len(), 1);
    assert!(session.documents()[0].text.contains("401"));
}

#[tokio::test(start_paused = true)]
async fn test_idle_watchdog_cancels_stalled_generation() {
    let (tx, stream) = manual();
    let settings = ControllerSettings {
        idle_timeout: Some(Duration::from_secs(30)),
        ..ControllerSettings::default()
    };
    let controller =
        GenerationController::with_settings(ScriptedGenerator::new(vec![stream]), settings);
    let handle = lesson_handle();

    let ticket = controller
        .start_generation(&handle, lesson_prompt("Lento"))
        .await
        .unwrap();
    tx.unbounded_send(Ok("começo".into())).unwrap();

    let outcome = ticket.wait().await.unwrap();

    assert_eq!(outcome.status, GenerationStatus::Cancelled);
    assert_eq!(outcome.text, "começo");
    assert_eq!(handle.read().await.phase(), SessionPhase::Idle);
    drop(tx);
}

#[tokio::test]
async fn test_interview_turn_returns_to_active() {
    let generator = ScriptedGenerator::new(vec![fixed(&["Como você ", "começaria?"])]);
    let controller = GenerationController::new(generator);
    let mut session = Session::new("Root/doc.md", StudyMode::Interview);
    session.commit().unwrap();
    let handle = Arc::new(SessionHandle::new(session));

    let prompt = PromptPayload {
        note_id: "Root/doc.md".into(),
        note_text: String::new(),
        request: GenerationRequest::Interview(InterviewRequest {
            challenge: "Encurtador de URL".into(),
        }),
        history: Vec::new(),
    };
    let outcome = controller
        .start_generation(&handle, prompt)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    let session = handle.snapshot().await;
    assert_eq!(session.phase(), SessionPhase::Active);
    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.messages()[0].text, "Como você começaria?");
    assert_eq!(outcome.text, "Como você começaria?");
}

#[tokio::test]
async fn test_completed_solution_carries_answer_key() {
    let generator = ScriptedGenerator::new(vec![fixed(&[
        "Questão 1: ...\n",
        "✅ Resposta ",
        "Correta: B\n",
    ])]);
    let controller = GenerationController::new(generator);
    let handle = Arc::new(SessionHandle::new(Session::new(
        "Root/doc.md",
        StudyMode::Workbook,
    )));

    let prompt = PromptPayload {
        note_id: "Root/doc.md".into(),
        note_text: String::new(),
        request: GenerationRequest::Workbook(WorkbookRequest {
            title: "Lista 1".into(),
            exercises: "1) ...".into(),
        }),
        history: Vec::new(),
    };
    let outcome = controller
        .start_generation(&handle, prompt)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(outcome.answer_key, vec!['B']);
}
