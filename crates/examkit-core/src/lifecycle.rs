//! Session lifecycle driver.
//!
//! Opens a session against the exam API, then runs the event loop: a
//! one-second countdown tick raced against user events. Time-up submits
//! automatically; a failed submission is reported and the loop keeps going so
//! the user can retry.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::api::ExamApi;
use crate::audio::AudioEvent;
use crate::error::SessionError;
use crate::notify::{Level, Notifier};
use crate::prefs::{MemoryPreferenceStore, PreferenceChange, PreferenceStore};
use crate::registry::Input;
use crate::route::SessionRoute;
use crate::session::SessionState;
use crate::timer::TickOutcome;

/// Configuration for the session driver.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Countdown tick period.
    pub tick_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
        }
    }
}

/// Something the test-taker did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Answer { question: String, input: Input },
    Clear { question: String },
    Next,
    Previous,
    JumpTo { question: String },
    SetPart { part: Option<u32> },
    Audio { audio: AudioEvent },
    Submit,
    Reset,
    Preferences { change: PreferenceChange },
}

/// How the event loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted {
        session_id: String,
        /// Where to send the test-taker, e.g. `/results/abc`.
        result_path: String,
        /// Submitted by time-up rather than by the user.
        automatic: bool,
    },
    /// The event source closed before a successful submission.
    Abandoned,
}

/// Adapt an mpsc receiver into the event stream [`SessionDriver::run`] takes.
pub fn channel_events(rx: mpsc::Receiver<SessionEvent>) -> impl Stream<Item = SessionEvent> {
    futures::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|event| (event, rx)) })
}

pub struct SessionDriver {
    api: Arc<dyn ExamApi>,
    notifier: Arc<dyn Notifier>,
    preferences: Arc<dyn PreferenceStore>,
    config: DriverConfig,
}

impl SessionDriver {
    pub fn new(api: Arc<dyn ExamApi>, notifier: Arc<dyn Notifier>, config: DriverConfig) -> Self {
        Self {
            api,
            notifier,
            preferences: Arc::new(MemoryPreferenceStore::new()),
            config,
        }
    }

    pub fn with_preference_store(mut self, store: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = store;
        self
    }

    /// Fetch the exam and start (or resume) its session.
    pub async fn open(&self, route: &SessionRoute) -> Result<SessionState> {
        let exam = match self.api.fetch_exam(&route.fetch_request()).await {
            Ok(exam) => exam,
            Err(e) => {
                self.notifier.notify(Level::Error, "Exam not found");
                return Err(SessionError::ExamUnavailable {
                    exam_id: route.exam_id.clone(),
                    message: format!("{e:#}"),
                }
                .into());
            }
        };
        tracing::info!(exam = %exam.id, sections = exam.sections.len(), questions = exam.question_count(), "exam fetched");

        let session_id = match &route.sid {
            Some(sid) => {
                tracing::info!(session = %sid, "resuming ticket session");
                sid.clone()
            }
            None => match self.api.start_session(&route.exam_id, route.section).await {
                Ok(started) => started.session_id,
                Err(e) => {
                    self.notifier.notify(Level::Error, "Could not start the exam session");
                    return Err(SessionError::StartFailed {
                        exam_id: route.exam_id.clone(),
                        message: format!("{e:#}"),
                    }
                    .into());
                }
            },
        };
        tracing::info!(session = %session_id, "session started");

        Ok(SessionState::new(exam, session_id).with_preferences(self.preferences.load()))
    }

    /// Run the event loop until the session is submitted or the event
    /// source closes. The tick interval is dropped with the loop.
    pub async fn run<S>(&self, state: &mut SessionState, events: S) -> Result<SubmitOutcome>
    where
        S: Stream<Item = SessionEvent>,
    {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        let mut events = std::pin::pin!(events);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if state.tick() != TickOutcome::TimeUp {
                        continue;
                    }
                    self.notifier.notify(Level::Warning, "Time is up. Submitting your answers.");
                    if let Some(outcome) = self.try_submit(state, true).await {
                        return Ok(outcome);
                    }
                }
                event = events.next() => {
                    let Some(event) = event else {
                        tracing::info!(session = %state.session_id(), "event source closed; abandoning session");
                        return Ok(SubmitOutcome::Abandoned);
                    };
                    if let Some(outcome) = self.handle(state, event).await {
                        return Ok(outcome);
                    }
                }
            }
        }
    }

    async fn handle(&self, state: &mut SessionState, event: SessionEvent) -> Option<SubmitOutcome> {
        let result = match event {
            SessionEvent::Answer { question, input } => state.input(&question, &input).map(drop),
            SessionEvent::Clear { question } => state.clear(&question).map(drop),
            SessionEvent::Next => {
                state.next();
                Ok(())
            }
            SessionEvent::Previous => {
                state.previous();
                Ok(())
            }
            SessionEvent::JumpTo { question } => {
                if !state.jump_to(&question) {
                    tracing::debug!(%question, "jump ignored");
                }
                Ok(())
            }
            SessionEvent::SetPart { part } => {
                state.set_part(part);
                Ok(())
            }
            SessionEvent::Audio { audio } => {
                let effect = state.audio_event(audio);
                tracing::trace!(?effect, "audio effect");
                Ok(())
            }
            SessionEvent::Reset => state.reset(),
            SessionEvent::Preferences { change } => {
                state.update_preferences(change, self.preferences.as_ref());
                Ok(())
            }
            SessionEvent::Submit => return self.try_submit(state, false).await,
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "event rejected");
            let level = if e.is_recoverable() {
                Level::Warning
            } else {
                Level::Error
            };
            self.notifier.notify(level, &e.to_string());
        }
        None
    }

    /// Submit, reporting failure to the user instead of returning it.
    async fn try_submit(&self, state: &mut SessionState, automatic: bool) -> Option<SubmitOutcome> {
        match self.submit(state).await {
            Ok(result_path) => Some(SubmitOutcome::Submitted {
                session_id: state.session_id().to_string(),
                result_path,
                automatic,
            }),
            Err(e) => {
                tracing::warn!(error = %e, automatic, "submission failed");
                None
            }
        }
    }

    /// Encode and post the answers. Returns the results path to redirect to.
    pub async fn submit(&self, state: &mut SessionState) -> Result<String, SessionError> {
        let payload = state.begin_submit()?;
        let session_id = state.session_id().to_string();
        tracing::info!(session = %session_id, answers = payload.answers.len(), "submitting");

        let result = self
            .api
            .submit(&session_id, &payload)
            .await
            .map(|response| response.results_path(&session_id))
            .map_err(|e| format!("{e:#}"));
        match state.finish_submit(result) {
            Ok(path) => {
                self.notifier.notify(Level::Success, "Exam submitted");
                tracing::info!(session = %session_id, %path, "submitted");
                Ok(path)
            }
            Err(e) => {
                self.notifier
                    .notify(Level::Error, "Submission failed. Your answers are kept; try again.");
                Err(e)
            }
        }
    }
}
