//! Chat session: the `submit(question)` entry point.
//!
//! A session owns the dedup registry for its lifetime and runs one turn at
//! a time. Turns run on their own tokio task; progress reaches the
//! presentation layer through the `TurnSink`.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::adapters::ReqwestHttpClient;
use crate::chat::registry::DedupRegistry;
use crate::chat::supervisor::{Supervisor, TurnOutcome};
use crate::chat::turn::{Turn, TurnId, TurnStatus};
use crate::error::{ConfigError, FailureKind};
use crate::startup::config::ChatConfig;
use crate::traits::{HttpClient, TurnSink};

/// Why `submit` did not start a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    /// The question is empty after trimming
    Blank,
    /// Another turn has not finished yet
    TurnInProgress,
}

impl fmt::Display for SubmitRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitRejected::Blank => write!(f, "Question is empty"),
            SubmitRejected::TurnInProgress => write!(f, "A turn is already in progress"),
        }
    }
}

impl std::error::Error for SubmitRejected {}

/// Handle to a running turn.
#[derive(Debug)]
pub struct TurnHandle {
    id: TurnId,
    join: JoinHandle<TurnOutcome>,
}

impl TurnHandle {
    pub fn id(&self) -> &TurnId {
        &self.id
    }

    /// Wait for the turn to end.
    pub async fn wait(self) -> TurnOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(turn_id = %self.id, error = %e, "Turn task did not complete");
                TurnOutcome::Failed(FailureKind::EmptyResult)
            }
        }
    }
}

/// Keeps the transcript in step with the supervisor, then forwards.
struct TranscriptSink {
    transcript: Arc<Mutex<Vec<Turn>>>,
    inner: Arc<dyn TurnSink>,
}

impl TurnSink for TranscriptSink {
    fn on_streaming(&self, turn_id: &TurnId) {
        update_turn(&self.transcript, turn_id, |turn| {
            if turn.status == TurnStatus::Pending {
                turn.status = TurnStatus::Streaming;
            }
        });
        self.inner.on_streaming(turn_id);
    }

    fn on_update(&self, turn_id: &TurnId, text: &str) {
        update_turn(&self.transcript, turn_id, |turn| turn.answer = text.to_string());
        self.inner.on_update(turn_id, text);
    }

    fn on_finalized(&self, turn_id: &TurnId, text: &str) {
        self.inner.on_finalized(turn_id, text);
    }

    fn on_failed(&self, turn_id: &TurnId, kind: FailureKind) {
        self.inner.on_failed(turn_id, kind);
    }
}

/// Clears the in-flight flag when the turn task ends, however it ends.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct ChatSession {
    supervisor: Arc<Supervisor>,
    in_flight: Arc<AtomicBool>,
    transcript: Arc<Mutex<Vec<Turn>>>,
}

fn lock_transcript(transcript: &Mutex<Vec<Turn>>) -> MutexGuard<'_, Vec<Turn>> {
    transcript.lock().unwrap_or_else(|e| e.into_inner())
}

impl ChatSession {
    /// Session with a fresh dedup registry.
    pub fn new(config: ChatConfig, http: Arc<dyn HttpClient>, sink: Arc<dyn TurnSink>) -> Self {
        Self::with_registry(config, http, Arc::new(DedupRegistry::new()), sink)
    }

    pub fn with_registry(
        config: ChatConfig,
        http: Arc<dyn HttpClient>,
        registry: Arc<DedupRegistry>,
        sink: Arc<dyn TurnSink>,
    ) -> Self {
        let transcript = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::new(TranscriptSink {
            transcript: Arc::clone(&transcript),
            inner: sink,
        });
        Self {
            supervisor: Arc::new(Supervisor::new(config, http, registry, sink)),
            in_flight: Arc::new(AtomicBool::new(false)),
            transcript,
        }
    }

    /// Session configured from the environment, using reqwest.
    pub fn from_env(sink: Arc<dyn TurnSink>) -> Result<Self, ConfigError> {
        let config = ChatConfig::from_env()?;
        Ok(Self::new(config, Arc::new(ReqwestHttpClient::new()), sink))
    }

    pub fn config(&self) -> &ChatConfig {
        self.supervisor.config()
    }

    pub fn registry(&self) -> &Arc<DedupRegistry> {
        self.supervisor.registry()
    }

    /// Whether a turn is currently running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Start a turn for `question`.
    pub fn submit(&self, question: &str) -> Result<TurnHandle, SubmitRejected> {
        if question.trim().is_empty() {
            return Err(SubmitRejected::Blank);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SubmitRejected::TurnInProgress);
        }
        let guard = InFlightGuard(Arc::clone(&self.in_flight));

        let turn = Turn::new(question);
        let id = turn.id.clone();
        lock_transcript(&self.transcript).push(turn);
        info!(turn_id = %id, "Turn submitted");

        let supervisor = Arc::clone(&self.supervisor);
        let transcript = Arc::clone(&self.transcript);
        let question = question.to_string();
        let turn_id = id.clone();
        let join = tokio::spawn(async move {
            let _guard = guard;
            let outcome = supervisor.run_turn(turn_id.clone(), &question).await;
            update_turn(&transcript, &turn_id, |turn| apply_outcome(turn, &outcome));
            outcome
        });

        Ok(TurnHandle { id, join })
    }

    /// Submit and wait for the outcome.
    pub async fn ask(&self, question: &str) -> Result<TurnOutcome, SubmitRejected> {
        Ok(self.submit(question)?.wait().await)
    }

    /// Snapshot of all turns, oldest first.
    pub fn transcript(&self) -> Vec<Turn> {
        lock_transcript(&self.transcript).clone()
    }
}

fn update_turn<F>(transcript: &Mutex<Vec<Turn>>, id: &TurnId, f: F)
where
    F: FnOnce(&mut Turn),
{
    if let Some(turn) = lock_transcript(transcript).iter_mut().find(|t| &t.id == id) {
        f(turn);
    }
}

fn apply_outcome(turn: &mut Turn, outcome: &TurnOutcome) {
    match outcome {
        TurnOutcome::Finalized { text, source } => {
            turn.answer = text.clone();
            turn.source = Some(*source);
            turn.status = TurnStatus::Finalized;
        }
        TurnOutcome::Failed(kind) => {
            turn.failure = Some(*kind);
            turn.status = TurnStatus::Failed;
        }
    }
}
