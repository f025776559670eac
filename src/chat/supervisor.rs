//! Stall/timeout supervisor.
//!
//! Drives one turn from the primary request to exactly one terminal sink
//! callback. Three paths can race to recover an empty turn through the
//! fallback endpoint:
//!
//! - the global deadline, armed when the primary stream opens
//! - the stage deadline, armed by the first primary-agent stage start
//! - stream completion with no accumulated text
//!
//! Each of them claims `TurnFlag::FallbackCalled` in the dedup registry
//! before issuing the request, so at most one fallback call is made per
//! turn. Finalization and failure happen under the turn's state lock and
//! are no-ops once the turn is terminal.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::chat::accumulator::Accumulator;
use crate::chat::fallback::FallbackClient;
use crate::chat::registry::{DedupRegistry, TurnFlag};
use crate::chat::turn::{AnswerSource, TurnId};
use crate::error::{ChatError, FailureKind, NetworkError, StreamError};
use crate::sse::{data_frames, parse_event, StreamEvent};
use crate::startup::config::ChatConfig;
use crate::traits::{Headers, HttpClient, TurnSink};

/// Supervisor state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorPhase {
    Idle,
    Streaming,
    /// Finalized from streamed content
    Finalized,
    /// Finalized from the fallback response
    FailedOverToFallback,
    Failed,
}

impl SupervisorPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SupervisorPhase::Finalized
                | SupervisorPhase::FailedOverToFallback
                | SupervisorPhase::Failed
        )
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Finalized { text: String, source: AnswerSource },
    Failed(FailureKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deadline {
    /// Response headers still outstanding
    Response,
    Global,
    Stage,
}

impl Deadline {
    fn as_str(&self) -> &'static str {
        match self {
            Deadline::Response => "response_deadline",
            Deadline::Global => "global_deadline",
            Deadline::Stage => "stage_deadline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FallbackPhase {
    NotStarted,
    InFlight,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FallbackAttempt {
    /// Another path holds the claim, or the turn no longer needs it
    NotClaimed,
    Finalized,
    /// Usable text arrived after the turn got content or ended
    Superseded,
    Unusable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameAction {
    Continue,
    ArmStageDeadline,
    Stop,
}

#[derive(Debug)]
struct SupervisorState {
    phase: SupervisorPhase,
    accumulator: Accumulator,
    requested_at: Instant,
    started_at: Option<Instant>,
    last_meaningful_token_at: Option<Instant>,
    main_stage_timer_armed: bool,
    fallback_called: bool,
    outcome: Option<TurnOutcome>,
}

/// State shared between the stream loop and the deadline tasks of one turn.
struct TurnShared {
    turn_id: TurnId,
    question: String,
    state: Mutex<SupervisorState>,
    sink: Arc<dyn TurnSink>,
    registry: Arc<DedupRegistry>,
    fallback: FallbackClient,
    fallback_phase: watch::Sender<FallbackPhase>,
    terminal: watch::Sender<bool>,
}

impl TurnShared {
    fn lock(&self) -> MutexGuard<'_, SupervisorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_terminal(&self) -> bool {
        self.lock().phase.is_terminal()
    }

    fn begin_streaming(&self) {
        let mut state = self.lock();
        if state.phase == SupervisorPhase::Idle {
            state.phase = SupervisorPhase::Streaming;
            state.started_at = Some(Instant::now());
            self.sink.on_streaming(&self.turn_id);
        }
    }

    fn spawn_deadline(self: &Arc<Self>, deadline: Deadline, after: Duration) -> JoinHandle<()> {
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            shared.on_deadline(deadline, after).await;
        })
    }

    async fn on_deadline(&self, deadline: Deadline, after: Duration) {
        let stalled = ChatError::from(StreamError::Stalled {
            deadline_ms: after.as_millis() as u64,
        });
        {
            let state = self.lock();
            if state.phase.is_terminal() {
                return;
            }
            // Once the stream is open the global deadline takes over
            if deadline == Deadline::Response && state.phase != SupervisorPhase::Idle {
                return;
            }
            if !state.accumulator.is_empty() {
                debug!(
                    turn_id = %self.turn_id,
                    deadline = deadline.as_str(),
                    "Deadline passed with content streaming"
                );
                return;
            }
            let since = state
                .last_meaningful_token_at
                .or(state.started_at)
                .unwrap_or(state.requested_at);
            info!(
                turn_id = %self.turn_id,
                deadline = deadline.as_str(),
                code = stalled.error_code(),
                elapsed_ms = since.elapsed().as_millis() as u64,
                "Deadline expired without content"
            );
        }
        if stalled.category().triggers_fallback() {
            self.run_fallback(deadline.as_str()).await;
        }
    }

    /// Route a primary transport error through the error taxonomy.
    ///
    /// Errors the user must see fail the turn now. Recoverable ones leave
    /// the turn to `complete`, which takes the guarded fallback path.
    fn on_primary_error(&self, err: &ChatError) {
        let category = err.category();
        warn!(
            turn_id = %self.turn_id,
            code = err.error_code(),
            category = %category,
            error = %err,
            "Primary transport failed"
        );
        if let Some(kind) = err.failure_kind() {
            self.fail(kind);
        } else if !category.triggers_fallback() {
            self.fail(FailureKind::EmptyResult);
        }
    }

    fn on_frame(&self, data: &str, config: &ChatConfig) -> FrameAction {
        let event = match parse_event(data) {
            Ok(event) => event,
            Err(err) => {
                let err = StreamError::from(err);
                warn!(
                    turn_id = %self.turn_id,
                    code = err.error_code(),
                    data = %data,
                    "Dropping malformed frame"
                );
                return FrameAction::Continue;
            }
        };

        let mut state = self.lock();
        if state.phase.is_terminal() {
            debug!(turn_id = %self.turn_id, event = event.kind(), "Ignoring event after finalization");
            return FrameAction::Stop;
        }

        match event {
            StreamEvent::Token(text) | StreamEvent::AgentText(text) => {
                Self::append_locked(&mut state, &text);
            }
            StreamEvent::FinalText(text) => {
                // The final summary repeats the streamed answer; only keep it
                // when nothing was streamed.
                if state.accumulator.is_empty() {
                    Self::append_locked(&mut state, &text);
                }
            }
            StreamEvent::StageStarted(label) => {
                debug!(turn_id = %self.turn_id, label = %label, "Stage started");
                if config.is_primary_agent(&label)
                    && !state.main_stage_timer_armed
                    && self.registry.try_acquire(&self.turn_id, TurnFlag::TimeoutArmed)
                {
                    state.main_stage_timer_armed = true;
                    return FrameAction::ArmStageDeadline;
                }
            }
            StreamEvent::StageEnded(label) => {
                debug!(turn_id = %self.turn_id, label = %label, "Stage finished");
            }
            StreamEvent::End => {
                debug!(turn_id = %self.turn_id, "End event received");
                return FrameAction::Stop;
            }
            StreamEvent::Unknown => {}
        }
        FrameAction::Continue
    }

    fn append_locked(state: &mut SupervisorState, text: &str) {
        if state.accumulator.append(text) {
            state.last_meaningful_token_at = Some(Instant::now());
        }
    }

    async fn run_fallback(&self, trigger: &'static str) -> FallbackAttempt {
        {
            let mut state = self.lock();
            if state.phase.is_terminal() || !state.accumulator.is_empty() {
                return FallbackAttempt::NotClaimed;
            }
            if !self
                .registry
                .try_acquire(&self.turn_id, TurnFlag::FallbackCalled)
            {
                debug!(turn_id = %self.turn_id, trigger, "Fallback already claimed");
                return FallbackAttempt::NotClaimed;
            }
            state.fallback_called = true;
            self.fallback_phase.send_replace(FallbackPhase::InFlight);
        }

        info!(
            turn_id = %self.turn_id,
            trigger,
            url = %self.fallback.url(),
            "Calling fallback endpoint"
        );
        let result = self.fallback.fetch(&self.question).await;

        let attempt = match result {
            Ok(text) => {
                let mut state = self.lock();
                if state.phase.is_terminal() || !state.accumulator.is_empty() {
                    info!(turn_id = %self.turn_id, trigger, "Discarding fallback answer; stream produced content");
                    FallbackAttempt::Superseded
                } else {
                    self.finalize_locked(&mut state, text, AnswerSource::Fallback);
                    FallbackAttempt::Finalized
                }
            }
            Err(err) => {
                warn!(
                    turn_id = %self.turn_id,
                    trigger,
                    code = err.error_code(),
                    error = %err,
                    "Fallback unavailable"
                );
                FallbackAttempt::Unusable
            }
        };
        self.fallback_phase.send_replace(FallbackPhase::Done);
        attempt
    }

    async fn wait_for_terminal(&self) {
        let mut rx = self.terminal.subscribe();
        loop {
            let done = *rx.borrow_and_update();
            if done || rx.changed().await.is_err() {
                return;
            }
        }
    }

    async fn wait_for_fallback(&self) {
        let mut rx = self.fallback_phase.subscribe();
        loop {
            let phase = *rx.borrow_and_update();
            if phase != FallbackPhase::InFlight {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Resolve the turn after the primary stream is gone.
    async fn complete(&self) {
        {
            let mut state = self.lock();
            if state.phase.is_terminal() {
                return;
            }
            if !state.accumulator.is_empty() {
                let text = state.accumulator.text().to_string();
                self.finalize_locked(&mut state, text, AnswerSource::Stream);
                return;
            }
        }

        match self.run_fallback("stream_end").await {
            FallbackAttempt::Finalized | FallbackAttempt::Superseded => return,
            FallbackAttempt::NotClaimed => self.wait_for_fallback().await,
            FallbackAttempt::Unusable => {}
        }

        let mut state = self.lock();
        if !state.accumulator.is_empty() && !state.phase.is_terminal() {
            let text = state.accumulator.text().to_string();
            self.finalize_locked(&mut state, text, AnswerSource::Stream);
        } else {
            self.fail_locked(&mut state, FailureKind::EmptyResult);
        }
    }

    fn finalize_locked(&self, state: &mut SupervisorState, text: String, source: AnswerSource) {
        if state.phase.is_terminal() {
            return;
        }
        state.accumulator.seal();
        state.phase = match source {
            AnswerSource::Stream => SupervisorPhase::Finalized,
            AnswerSource::Fallback => SupervisorPhase::FailedOverToFallback,
        };
        info!(
            turn_id = %self.turn_id,
            source = ?source,
            len = text.len(),
            fallback_called = state.fallback_called,
            "Turn finalized"
        );
        self.sink.on_finalized(&self.turn_id, &text);
        state.outcome = Some(TurnOutcome::Finalized { text, source });
        self.registry.release(&self.turn_id);
        self.terminal.send_replace(true);
    }

    fn fail_locked(&self, state: &mut SupervisorState, kind: FailureKind) {
        if state.phase.is_terminal() {
            return;
        }
        state.accumulator.seal();
        state.phase = SupervisorPhase::Failed;
        warn!(
            turn_id = %self.turn_id,
            kind = %kind,
            fallback_called = state.fallback_called,
            "Turn failed"
        );
        self.sink.on_failed(&self.turn_id, kind);
        state.outcome = Some(TurnOutcome::Failed(kind));
        self.registry.release(&self.turn_id);
        self.terminal.send_replace(true);
    }

    fn fail(&self, kind: FailureKind) {
        let mut state = self.lock();
        self.fail_locked(&mut state, kind);
    }

    fn outcome(&self) -> TurnOutcome {
        self.lock()
            .outcome
            .clone()
            .unwrap_or(TurnOutcome::Failed(FailureKind::EmptyResult))
    }
}

/// Deadline tasks of one turn; any still pending are aborted on drop.
#[derive(Default)]
struct TurnTimers(Vec<JoinHandle<()>>);

impl TurnTimers {
    fn push(&mut self, handle: JoinHandle<()>) {
        self.0.push(handle);
    }
}

impl Drop for TurnTimers {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Runs turns against the primary and fallback endpoints.
///
/// One supervisor serves a whole session; per-turn state lives only for the
/// duration of `run_turn`.
pub struct Supervisor {
    config: ChatConfig,
    http: Arc<dyn HttpClient>,
    fallback: FallbackClient,
    registry: Arc<DedupRegistry>,
    sink: Arc<dyn TurnSink>,
}

impl Supervisor {
    pub fn new(
        config: ChatConfig,
        http: Arc<dyn HttpClient>,
        registry: Arc<DedupRegistry>,
        sink: Arc<dyn TurnSink>,
    ) -> Self {
        let fallback = FallbackClient::new(Arc::clone(&http), config.fallback_url.clone());
        Self {
            config,
            http,
            fallback,
            registry,
            sink,
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<DedupRegistry> {
        &self.registry
    }

    /// Run one turn to completion.
    ///
    /// The sink receives cumulative updates followed by exactly one of
    /// `on_finalized` / `on_failed`; the same outcome is returned.
    pub async fn run_turn(&self, turn_id: TurnId, question: &str) -> TurnOutcome {
        let (fallback_phase, _) = watch::channel(FallbackPhase::NotStarted);
        let (terminal, _) = watch::channel(false);
        let shared = Arc::new(TurnShared {
            turn_id: turn_id.clone(),
            question: question.to_string(),
            state: Mutex::new(SupervisorState {
                phase: SupervisorPhase::Idle,
                accumulator: Accumulator::new(turn_id.clone(), Arc::clone(&self.sink)),
                requested_at: Instant::now(),
                started_at: None,
                last_meaningful_token_at: None,
                main_stage_timer_armed: false,
                fallback_called: false,
                outcome: None,
            }),
            sink: Arc::clone(&self.sink),
            registry: Arc::clone(&self.registry),
            fallback: self.fallback.clone(),
            fallback_phase,
            terminal,
        });
        let mut timers = TurnTimers::default();

        let body = json!({ "question": question, "streaming": true }).to_string();
        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), "text/event-stream".to_string());

        debug!(turn_id = %turn_id, url = %self.config.primary_url, "Opening primary stream");
        // The response deadline only triggers the guarded fallback; the
        // primary request keeps going until the turn ends.
        timers.push(shared.spawn_deadline(Deadline::Response, self.config.global_deadline));
        let opened = tokio::select! {
            opened = self.http.post_stream(&self.config.primary_url, &body, &headers) => Some(opened),
            _ = shared.wait_for_terminal() => None,
        };

        match opened {
            Some(Ok(bytes)) => {
                shared.begin_streaming();
                info!(turn_id = %turn_id, "Primary stream open");
                timers.push(shared.spawn_deadline(Deadline::Global, self.config.global_deadline));
                self.consume(&shared, &mut timers, bytes).await;
            }
            Some(Err(err)) => {
                let err = ChatError::from(NetworkError::from_http(&self.config.primary_url, err));
                shared.on_primary_error(&err);
            }
            None => {
                debug!(turn_id = %turn_id, "Turn resolved before the primary stream opened");
            }
        }

        shared.complete().await;
        drop(timers);
        shared.outcome()
    }

    async fn consume(
        &self,
        shared: &Arc<TurnShared>,
        timers: &mut TurnTimers,
        bytes: crate::traits::ByteStream,
    ) {
        let mut frames = Box::pin(data_frames(bytes));
        let mut terminal_rx = shared.terminal.subscribe();
        loop {
            let done = *terminal_rx.borrow_and_update();
            if done {
                break;
            }
            tokio::select! {
                changed = terminal_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                next = frames.next() => match next {
                    Some(Ok(data)) => match shared.on_frame(&data, &self.config) {
                        FrameAction::Continue => {}
                        FrameAction::ArmStageDeadline => {
                            info!(
                                turn_id = %shared.turn_id,
                                deadline_ms = self.config.stage_deadline.as_millis() as u64,
                                "Primary agent started; arming stage deadline"
                            );
                            timers.push(
                                shared.spawn_deadline(Deadline::Stage, self.config.stage_deadline),
                            );
                        }
                        FrameAction::Stop => break,
                    },
                    Some(Err(err)) => {
                        let err = ChatError::from(StreamError::ReadFailed { message: err.to_string() });
                        shared.on_primary_error(&err);
                        break;
                    }
                    None => {
                        debug!(turn_id = %shared.turn_id, "Primary stream closed");
                        break;
                    }
                },
            }
        }
        if shared.is_terminal() {
            debug!(turn_id = %shared.turn_id, "Stream loop left after turn ended");
        }
    }
}
