use crate::analyzer::{self, ANALYSIS_INTERVAL_MS, MIN_TRANSCRIPT_CHARS};
use crate::domain::{ConversationAnalysis, GeneratedQuestion, SessionReport, Vibe};
use crate::question::{self, QuestionContext};
use crate::reasoning::Reasoning;
use crate::summary;
use crate::timing;
use crate::transcript::{TranscriptLog, TranscriptSegment};
use crate::{Command, SessionEvent};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// How often the scheduler re-evaluates whether to interject a question.
pub const TICK_INTERVAL_MS: u64 = 15_000;

/// Window of recent conversation fed to analysis and generation.
pub const RECENT_WINDOW_MINUTES: u64 = 5;

/// Milliseconds since the Unix epoch; the engine's single clock read.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Result of a spawned external-call task, delivered back to the scheduler
/// loop so the loop itself never blocks on the reasoning service.
#[derive(Debug)]
enum TaskOutcome {
    Analysis(ConversationAnalysis),
    /// `None` when the timing gate denied the ask.
    Asked(Option<GeneratedQuestion>),
}

/// The orchestration state machine for one session.
///
/// All state is owned by this struct and mutated only from its own event
/// loop; external calls run on spawned tasks holding cloned snapshots and
/// report back through the outcome channel. The `analyzing` and `generating`
/// flags enforce single-flight per call class: a second request while one is
/// pending is dropped, not queued.
pub struct FacilitationSession<R> {
    reasoning: Arc<R>,
    vibe: Vibe,
    log: TranscriptLog,
    analysis: Option<ConversationAnalysis>,
    last_analysis_ms: Option<u64>,
    asked_questions: Vec<String>,
    questions_answered: usize,
    current_question: Option<GeneratedQuestion>,
    analyzing: bool,
    generating: bool,
    force_pending: bool,
    last_question_ms: u64,
    started_ms: u64,
    command_tx: mpsc::Sender<Command>,
    outcome_tx: mpsc::Sender<TaskOutcome>,
    outcome_rx: Option<mpsc::Receiver<TaskOutcome>>,
    call_tasks: Vec<JoinHandle<()>>,
}

impl<R: Reasoning + Send + Sync + 'static> FacilitationSession<R> {
    pub fn new(reasoning: Arc<R>, vibe: Vibe, command_tx: mpsc::Sender<Command>, now_ms: u64) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel(8);
        Self {
            reasoning,
            vibe,
            log: TranscriptLog::new(),
            analysis: None,
            last_analysis_ms: None,
            asked_questions: Vec::new(),
            questions_answered: 0,
            current_question: None,
            analyzing: false,
            generating: false,
            force_pending: false,
            last_question_ms: 0,
            started_ms: now_ms,
            command_tx,
            outcome_tx,
            outcome_rx: Some(outcome_rx),
            call_tasks: Vec::new(),
        }
    }

    pub fn current_question(&self) -> Option<&GeneratedQuestion> {
        self.current_question.as_ref()
    }

    pub fn asked_questions(&self) -> &[String] {
        &self.asked_questions
    }

    pub fn questions_answered(&self) -> usize {
        self.questions_answered
    }

    /// Drive the session until an `End` event arrives or the event source
    /// closes. Emits `Command`s as questions become ready, and finishes with
    /// a single `Command::SessionComplete`.
    pub async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) {
        let Some(mut outcome_rx) = self.outcome_rx.take() else {
            return;
        };

        let mut tick = tokio::time::interval(Duration::from_millis(TICK_INTERVAL_MS));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => self.handle_tick(now_ms()),
                Some(outcome) = outcome_rx.recv() => self.on_outcome(outcome, now_ms()).await,
                event = events.recv() => match event {
                    Some(SessionEvent::Segment(segment)) => self.ingest(segment),
                    Some(SessionEvent::Dismiss) => self.dismiss(),
                    Some(SessionEvent::Skip) => self.skip(),
                    Some(SessionEvent::ForceNext) => self.handle_force(now_ms()),
                    Some(SessionEvent::End) | None => break,
                },
            }
        }

        let report = self.end(now_ms()).await;
        if self
            .command_tx
            .send(Command::SessionComplete(report))
            .await
            .is_err()
        {
            tracing::warn!("command receiver dropped before the session report was delivered");
        }
    }

    pub fn ingest(&mut self, segment: TranscriptSegment) {
        tracing::debug!(
            speaker = %segment.speaker_name,
            is_final = segment.is_final,
            "ingesting transcript segment"
        );
        self.log.ingest(segment);
    }

    /// Periodic check: refresh the analysis if it has gone stale, otherwise
    /// run the gate-and-generate pipeline. A tick that arrives while either
    /// is already in flight does nothing.
    pub fn handle_tick(&mut self, now_ms: u64) {
        if self.current_question.is_some() || self.generating {
            return;
        }

        let recent = self.log.recent_transcript(RECENT_WINDOW_MINUTES, now_ms);
        if recent.chars().count() < MIN_TRANSCRIPT_CHARS {
            return;
        }

        let analysis_stale = match self.last_analysis_ms {
            None => true,
            Some(at) => now_ms.saturating_sub(at) > ANALYSIS_INTERVAL_MS,
        };
        if analysis_stale {
            // The gate check resumes from on_outcome once the analysis lands.
            self.spawn_analysis(recent);
            return;
        }

        self.spawn_ask(recent, now_ms, true);
    }

    /// Explicit "next question" request: bypasses the timing gate but still
    /// honors both single-flight constraints. Clears any presented question.
    pub fn handle_force(&mut self, now_ms: u64) {
        if self.generating {
            return;
        }
        self.current_question = None;

        let recent = self.log.recent_transcript(RECENT_WINDOW_MINUTES, now_ms);
        if self.analysis.is_none() {
            if self.analyzing {
                self.force_pending = true;
                return;
            }
            if recent.chars().count() < MIN_TRANSCRIPT_CHARS {
                tracing::debug!("not enough conversation yet to force a question");
                return;
            }
            self.force_pending = true;
            self.spawn_analysis(recent);
            return;
        }

        self.spawn_ask(recent, now_ms, false);
    }

    /// The question was answered: clear it and credit it for the report.
    pub fn dismiss(&mut self) {
        if self.current_question.take().is_some() {
            self.questions_answered += 1;
        }
    }

    /// The question was skipped: clear it without crediting it.
    pub fn skip(&mut self) {
        self.current_question = None;
    }

    async fn on_outcome(&mut self, outcome: TaskOutcome, now_ms: u64) {
        match outcome {
            TaskOutcome::Analysis(analysis) => {
                self.analyzing = false;
                self.analysis = Some(analysis);
                self.last_analysis_ms = Some(now_ms);

                let recent = self.log.recent_transcript(RECENT_WINDOW_MINUTES, now_ms);
                if self.force_pending {
                    self.force_pending = false;
                    self.spawn_ask(recent, now_ms, false);
                } else if self.current_question.is_none() {
                    self.spawn_ask(recent, now_ms, true);
                }
            }
            TaskOutcome::Asked(None) => {
                self.generating = false;
            }
            TaskOutcome::Asked(Some(question)) => {
                self.generating = false;
                self.asked_questions.push(question.question.clone());
                self.last_question_ms = now_ms;
                self.current_question = Some(question.clone());
                if self
                    .command_tx
                    .send(Command::PresentQuestion(question))
                    .await
                    .is_err()
                {
                    tracing::warn!("command receiver dropped, question not presented");
                }
            }
        }
    }

    fn spawn_analysis(&mut self, recent: String) {
        if self.analyzing {
            return;
        }
        self.analyzing = true;

        let reasoning = Arc::clone(&self.reasoning);
        let vibe = self.vibe;
        let asked = self.asked_questions.clone();
        let outcome_tx = self.outcome_tx.clone();
        self.call_tasks.push(tokio::spawn(async move {
            let analysis = analyzer::analyze(reasoning.as_ref(), &recent, vibe, &asked).await;
            let _ = outcome_tx.send(TaskOutcome::Analysis(analysis)).await;
        }));
    }

    /// Gate-and-generate pipeline. The gate's external judgment runs inside
    /// the generation-flagged task, so together they form the one
    /// outstanding "ask" operation.
    fn spawn_ask(&mut self, recent: String, now_ms: u64, gated: bool) {
        if self.generating {
            return;
        }
        let Some(analysis) = self.analysis.clone() else {
            return;
        };
        self.generating = true;

        let reasoning = Arc::clone(&self.reasoning);
        let vibe = self.vibe;
        let asked = self.asked_questions.clone();
        let last_segment_ms = self.log.last_final_timestamp_ms();
        let last_question_ms = self.last_question_ms;
        let outcome_tx = self.outcome_tx.clone();
        self.call_tasks.push(tokio::spawn(async move {
            if gated {
                let open = timing::should_ask(
                    reasoning.as_ref(),
                    &recent,
                    last_segment_ms,
                    last_question_ms,
                    now_ms,
                )
                .await;
                if !open {
                    let _ = outcome_tx.send(TaskOutcome::Asked(None)).await;
                    return;
                }
            }

            let context = QuestionContext {
                vibe,
                analysis,
                recent_transcript: recent,
                asked_questions: asked,
            };
            let question = question::generate(reasoning.as_ref(), &context).await;
            let _ = outcome_tx.send(TaskOutcome::Asked(Some(question))).await;
        }));
    }

    /// Terminal transition: cancel in-flight work and produce the report.
    /// Cancellation is best-effort; any result that still lands after this
    /// point is discarded with the outcome channel.
    pub async fn end(&mut self, now_ms: u64) -> SessionReport {
        for task in self.call_tasks.drain(..) {
            task.abort();
        }
        self.analyzing = false;
        self.generating = false;

        let duration_minutes = now_ms.saturating_sub(self.started_ms) / 60_000;
        let transcript = self.log.full_transcript();
        let session_summary = summary::summarize(
            self.reasoning.as_ref(),
            &transcript,
            self.vibe,
            duration_minutes,
            self.questions_answered,
        )
        .await;

        summary::build_report(
            session_summary,
            duration_minutes,
            self.questions_answered,
            &self.asked_questions,
        )
    }
}
