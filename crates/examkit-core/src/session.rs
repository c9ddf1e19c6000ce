//! Session state aggregate.
//!
//! One value owns everything a test-taker changes during an exam: answers,
//! position, countdown, audio gate, preferences and the submission phase.
//! Every answer mutation goes through [`SessionState::input`], which applies
//! handler updates only for keys the addressed question owns.

use serde::Serialize;

use crate::answers::{AnswerKey, AnswerStore};
use crate::audio::{AudioEffect, AudioEvent, AudioGate};
use crate::drag::{DragGesture, DragOutcome, DragPayload, ListenerRegistry, Point, SplitPane};
use crate::encoder::{encode_submission, SubmissionPayload};
use crate::error::SessionError;
use crate::model::{Exam, Question, QuestionKind, Section, SectionKind};
use crate::navigation::{self, Navigator};
use crate::passage::{segment, Paragraph};
use crate::prefs::{PreferenceChange, PreferenceStore, Preferences};
use crate::registry::{self, Context, Input, Update};
use crate::render::Rendered;
use crate::timer::{Countdown, TickOutcome};

/// Where the session is in its submission lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Active,
    Submitting,
    Submitted { result_path: String },
}

/// Answered vs. total answerable questions of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionProgress {
    pub section_id: String,
    pub kind: SectionKind,
    pub answered: usize,
    pub total: usize,
}

#[derive(Debug)]
pub struct SessionState {
    exam: Exam,
    session_id: String,
    answers: AnswerStore,
    nav: Navigator,
    countdown: Countdown,
    audio: Option<AudioGate>,
    preferences: Preferences,
    split: SplitPane,
    listeners: ListenerRegistry,
    phase: Phase,
}

impl SessionState {
    /// Build a fresh session. The countdown runs from the exam duration.
    pub fn new(exam: Exam, session_id: impl Into<String>) -> Self {
        let countdown = Countdown::from_secs(exam.duration_secs());
        let audio = exam.listening_audio().map(AudioGate::new);
        let nav = Navigator::new(&exam);
        Self {
            exam,
            session_id: session_id.into(),
            answers: AnswerStore::new(),
            nav,
            countdown,
            audio,
            preferences: Preferences::default(),
            split: SplitPane::default(),
            listeners: ListenerRegistry::new(),
            phase: Phase::Active,
        }
    }

    pub fn with_countdown(mut self, countdown: Countdown) -> Self {
        self.countdown = countdown;
        self
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences.normalized();
        self
    }

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn audio(&self) -> Option<&AudioGate> {
        self.audio.as_ref()
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
    }

    pub fn split_pane(&self) -> &SplitPane {
        &self.split
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.phase, Phase::Submitted { .. })
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Submitted { .. } => Err(SessionError::AlreadySubmitted(self.session_id.clone())),
            _ => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Answers
    // -----------------------------------------------------------------------

    /// Apply an input to a question. Returns the keys whose values changed,
    /// including keys another question lost to an exclusive assignment.
    pub fn input(&mut self, question_id: &str, input: &Input) -> Result<Vec<AnswerKey>, SessionError> {
        self.ensure_open()?;
        let (section, question) = locate(&self.exam, question_id)?;
        let updates = registry::encode(question, &Context::new(section, &self.answers), input);

        let mut changed = Vec::new();
        for update in updates {
            if !registry::owns(question, update.key()) {
                tracing::warn!(question = question_id, key = %update.key(), "dropping update for a key the question doesn't own");
                continue;
            }
            match update {
                Update::Set(key, value) => {
                    self.answers.set(key.clone(), value);
                    changed.push(key);
                }
                Update::Clear(key) => {
                    if self.answers.clear(std::slice::from_ref(&key)) > 0 {
                        changed.push(key);
                    }
                }
                Update::Exclusive { scope, key, value } => {
                    let evicted = self
                        .answers
                        .assign_exclusive(scope.matcher(section), key.clone(), &value);
                    for lost in &evicted {
                        tracing::debug!(%value, from = %lost, to = %key, "exclusive value moved");
                    }
                    changed.extend(evicted);
                    changed.push(key);
                }
            }
        }
        Ok(changed)
    }

    /// Clear every answer a question owns.
    pub fn clear(&mut self, question_id: &str) -> Result<Vec<AnswerKey>, SessionError> {
        self.input(question_id, &Input::Clear)
    }

    /// Drop all answers. Only the explicit reset action calls this.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        tracing::info!(session = %self.session_id, answers = self.answers.len(), "resetting answers");
        self.answers.reset();
        Ok(())
    }

    pub fn render(&self, question_id: &str) -> Result<Rendered, SessionError> {
        let (section, question) = locate(&self.exam, question_id)?;
        Ok(registry::render(question, &Context::new(section, &self.answers)))
    }

    /// The current question and its view.
    pub fn render_current(&self) -> Option<(&Question, Rendered)> {
        let section = self.nav.section(&self.exam)?;
        let question = self.nav.current(&self.exam)?;
        Some((question, registry::render(question, &Context::new(section, &self.answers))))
    }

    /// Questions of the current section that render inline under `anchor_id`.
    pub fn group_members(&self, anchor_id: &str) -> Vec<&Question> {
        self.nav
            .section(&self.exam)
            .map(|s| {
                s.questions
                    .iter()
                    .filter(|q| q.metadata.anchor_id.as_deref() == Some(anchor_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn next(&mut self) -> bool {
        self.nav.next(&self.exam)
    }

    pub fn previous(&mut self) -> bool {
        self.nav.previous(&self.exam)
    }

    pub fn jump_to(&mut self, question_id: &str) -> bool {
        self.nav.jump_to(&self.exam, question_id)
    }

    pub fn set_part(&mut self, part: Option<u32>) {
        self.nav.set_part(&self.exam, part);
    }

    pub fn parts(&self) -> Vec<u32> {
        self.nav
            .section(&self.exam)
            .map(navigation::parts)
            .unwrap_or_default()
    }

    /// Paragraphs of the current section's passage.
    pub fn segments(&self) -> Vec<Paragraph> {
        self.nav
            .section(&self.exam)
            .and_then(|s| s.passage.as_deref())
            .map(segment)
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Time, audio and pointer
    // -----------------------------------------------------------------------

    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.countdown.tick();
        if outcome == TickOutcome::TimeUp {
            tracing::info!(session = %self.session_id, "time is up");
        }
        outcome
    }

    pub fn audio_event(&mut self, event: AudioEvent) -> AudioEffect {
        match self.audio.as_mut() {
            Some(gate) => gate.handle(event),
            None => AudioEffect::None,
        }
    }

    /// Pointer down on a draggable heading, token or the divider.
    pub fn begin_drag(&self, payload: DragPayload, at: Point) -> DragGesture<DragPayload> {
        DragGesture::start(payload, at, &self.listeners)
    }

    /// Follow an active divider drag that began at ratio `from`.
    pub fn drag_divider(&mut self, from: f64, gesture: &DragGesture<DragPayload>) {
        self.split.follow(from, gesture);
    }

    pub fn set_pane_width(&mut self, width: f64) {
        self.split.set_width(width);
    }

    /// Pointer up over `target`. A completed heading or token drop becomes an
    /// input to the target question; a click changes nothing.
    pub fn finish_drag(
        &mut self,
        gesture: DragGesture<DragPayload>,
        at: Point,
        target: Option<&str>,
    ) -> Result<Vec<AnswerKey>, SessionError> {
        let (payload, target) = match (gesture.release(at), target) {
            (DragOutcome::Dropped { payload, .. }, Some(target)) => (payload, target),
            _ => return Ok(Vec::new()),
        };
        match payload {
            DragPayload::Heading(letter) => self.input(target, &Input::DropHeading(letter)),
            DragPayload::Token(token) => self.input(target, &Input::DropToken(token)),
            DragPayload::Divider => Ok(Vec::new()),
        }
    }

    // -----------------------------------------------------------------------
    // Preferences and progress
    // -----------------------------------------------------------------------

    /// Apply a preference change and persist it. A failed save is logged;
    /// preferences are cosmetic.
    pub fn update_preferences(
        &mut self,
        change: PreferenceChange,
        store: &dyn PreferenceStore,
    ) -> Preferences {
        self.preferences.apply(change);
        if let Err(e) = store.save(&self.preferences) {
            tracing::warn!(error = %e, "could not save preferences");
        }
        self.preferences
    }

    pub fn progress(&self) -> Vec<SectionProgress> {
        self.exam
            .sections
            .iter()
            .map(|section| {
                let answerable: Vec<&Question> = section
                    .questions
                    .iter()
                    .filter(|q| is_answerable(q, section))
                    .collect();
                SectionProgress {
                    section_id: section.id.clone(),
                    kind: section.kind,
                    answered: answerable
                        .iter()
                        .filter(|q| self.answers.is_answered(&q.id))
                        .count(),
                    total: answerable.len(),
                }
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    pub fn encode(&self) -> SubmissionPayload {
        encode_submission(&self.answers)
    }

    /// Enter the submitting phase and return the payload to send.
    pub fn begin_submit(&mut self) -> Result<SubmissionPayload, SessionError> {
        match self.phase {
            Phase::Submitted { .. } => Err(SessionError::AlreadySubmitted(self.session_id.clone())),
            Phase::Submitting => Err(SessionError::SubmitInProgress),
            Phase::Active => {
                self.phase = Phase::Submitting;
                Ok(self.encode())
            }
        }
    }

    /// Record the server's verdict. On failure the session stays live.
    pub fn finish_submit(&mut self, result: Result<String, String>) -> Result<String, SessionError> {
        match result {
            Ok(result_path) => {
                self.phase = Phase::Submitted {
                    result_path: result_path.clone(),
                };
                Ok(result_path)
            }
            Err(message) => {
                self.phase = Phase::Active;
                Err(SessionError::SubmitFailed(message))
            }
        }
    }
}

fn locate<'e>(exam: &'e Exam, question_id: &str) -> Result<(&'e Section, &'e Question), SessionError> {
    exam.sections
        .iter()
        .find_map(|s| s.question(question_id).map(|q| (s, q)))
        .ok_or_else(|| SessionError::UnknownQuestion(question_id.to_string()))
}

/// Whether a question takes answers of its own. Drag-and-drop banks and
/// composite-template anchors only host their members.
fn is_answerable(question: &Question, section: &Section) -> bool {
    if question.metadata.template.is_some() {
        return false;
    }
    !(question.kind == QuestionKind::DragDrop
        && question.metadata.anchor_id.is_none()
        && section.group_members(&question.id).next().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::AnswerValue;
    use crate::audio::AudioState;
    use crate::prefs::MemoryPreferenceStore;

    fn exam() -> Exam {
        serde_json::from_value(serde_json::json!({
            "id": "e1",
            "durationMinutes": 1,
            "audioUrl": "https://cdn.example/l.mp3",
            "sections": [
                {"id": "L", "type": "listening", "questions": [
                    {"id": "l1", "number": 1, "type": "short_answer"},
                    {"id": "T", "number": 2, "type": "simple_table", "metadata": {"table": {
                        "rows": [["a", "___"], [{"kind": "drag_drop"}, {"kind": "drag_drop"}]],
                        "tokens": ["x", "y"]
                    }}}
                ]},
                {"id": "R", "type": "reading",
                 "passage": "[[p1]]One.[[p2]]Two.",
                 "headingBank": [{"letter": "i"}, {"letter": "ii"}],
                 "questions": [
                    {"id": "h1", "number": 3, "type": "matching"},
                    {"id": "h2", "number": 4, "type": "matching"},
                    {"id": "bank", "number": 5, "type": "drag_drop", "metadata": {"tokens": ["red"]}},
                    {"id": "d1", "number": 6, "type": "drag_drop", "metadata": {"anchorId": "bank"}}
                ]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn exclusive_input_reports_evicted_keys() {
        let mut state = SessionState::new(exam(), "s1");
        state.input("h1", &Input::DropHeading("i".into())).unwrap();
        let changed = state.input("h2", &Input::DropHeading("i".into())).unwrap();
        assert_eq!(changed, vec![AnswerKey::question("h1"), AnswerKey::question("h2")]);
        assert!(state.answers().get_question("h1").is_none());
    }

    #[test]
    fn unknown_question_is_rejected() {
        let mut state = SessionState::new(exam(), "s1");
        assert!(matches!(
            state.input("nope", &Input::Text("x".into())),
            Err(SessionError::UnknownQuestion(_))
        ));
    }

    #[test]
    fn clear_only_touches_owned_keys() {
        let mut state = SessionState::new(exam(), "s1");
        state.input("l1", &Input::Text("river".into())).unwrap();
        state
            .input("T", &Input::Cell { row: 0, col: 1, input: Box::new(Input::Text("b".into())) })
            .unwrap();
        let cleared = state.clear("T").unwrap();
        assert_eq!(cleared.len(), 1);
        assert_eq!(state.answers().get_question("l1"), Some(&AnswerValue::single("river")));
    }

    #[test]
    fn drag_drop_through_gesture() {
        let mut state = SessionState::new(exam(), "s1");
        let mut gesture = state.begin_drag(DragPayload::Token("red".into()), Point::new(0.0, 0.0));
        assert_eq!(state.listeners().active(), 1);
        gesture.move_to(Point::new(20.0, 0.0));
        let changed = state.finish_drag(gesture, Point::new(20.0, 5.0), Some("d1")).unwrap();
        assert_eq!(changed, vec![AnswerKey::question("d1")]);
        assert_eq!(state.listeners().active(), 0);

        // A click is not a drop.
        let gesture = state.begin_drag(DragPayload::Heading("ii".into()), Point::new(0.0, 0.0));
        assert!(state.finish_drag(gesture, Point::new(1.0, 1.0), Some("h1")).unwrap().is_empty());
    }

    #[test]
    fn progress_counts_tables_once_and_skips_banks() {
        let mut state = SessionState::new(exam(), "s1");
        state
            .input("T", &Input::Cell { row: 1, col: 0, input: Box::new(Input::DropToken("x".into())) })
            .unwrap();
        let progress = state.progress();
        assert_eq!(progress[0].answered, 1);
        assert_eq!(progress[0].total, 2);
        assert_eq!(progress[1].total, 3);
    }

    #[test]
    fn submit_phases() {
        let mut state = SessionState::new(exam(), "s1");
        state.input("l1", &Input::Text("river".into())).unwrap();
        let payload = state.begin_submit().unwrap();
        assert_eq!(payload.answers.len(), 1);
        assert!(matches!(state.begin_submit(), Err(SessionError::SubmitInProgress)));

        let err = state.finish_submit(Err("503".into())).unwrap_err();
        assert!(err.is_recoverable());
        state.input("l1", &Input::Text("lake".into())).unwrap();

        state.begin_submit().unwrap();
        assert_eq!(state.finish_submit(Ok("/results/s1".into())).unwrap(), "/results/s1");
        assert!(state.is_submitted());
        assert!(matches!(
            state.input("l1", &Input::Text("late".into())),
            Err(SessionError::AlreadySubmitted(_))
        ));
    }

    #[test]
    fn time_up_once_and_audio_resumes() {
        let mut state = SessionState::new(exam(), "s1");
        assert_eq!(state.countdown().remaining_secs(), 60);
        let time_ups = (0..120).filter(|_| state.tick() == TickOutcome::TimeUp).count();
        assert_eq!(time_ups, 1);

        state.audio_event(AudioEvent::AutoplayStarted);
        assert_eq!(state.audio_event(AudioEvent::Paused), AudioEffect::Resume);
        assert_eq!(state.audio().map(|a| a.state()), Some(AudioState::Playing));
    }

    #[test]
    fn preferences_are_saved_on_change() {
        let store = MemoryPreferenceStore::new();
        let mut state = SessionState::new(exam(), "s1");
        let prefs = state.update_preferences(PreferenceChange::ToggleDarkMode, &store);
        assert!(prefs.dark_mode);
        assert_eq!(store.load(), prefs);
    }

    #[test]
    fn segments_follow_current_section() {
        let mut state = SessionState::new(exam(), "s1");
        assert!(state.segments().is_empty());
        assert_eq!(state.parts(), vec![1]);
        assert!(state.next());
        assert!(state.next());
        let paragraphs = state.segments();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[1].text, "Two.");
    }
}
