//! Listening audio gate.
//!
//! Playback starts once and runs to the end. Pauses are undone, seeks are
//! reverted and nothing replays after the end. If autoplay is refused, one
//! user gesture may start playback; no gesture can stop it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioState {
    NotStarted,
    /// Autoplay was refused; waiting for one explicit start.
    AutoplayBlocked,
    Playing,
    Ended,
}

/// Something the media element reported, or the user did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "at", rename_all = "snake_case")]
pub enum AudioEvent {
    AutoplayStarted,
    AutoplayRejected,
    UserStart,
    /// Playback position report, in seconds.
    Progress(f64),
    Paused,
    Seeked(f64),
    Ended,
}

/// What the caller must do to the media element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioEffect {
    None,
    Play,
    /// Undo a pause.
    Resume,
    /// Jump back to the given position.
    RevertSeek(f64),
    /// Playback completed. Reported once.
    Finished,
}

#[derive(Debug, Clone)]
pub struct AudioGate {
    url: String,
    state: AudioState,
    position: f64,
}

impl AudioGate {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: AudioState::NotStarted,
            position: 0.0,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> AudioState {
        self.state
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn handle(&mut self, event: AudioEvent) -> AudioEffect {
        use AudioEvent as E;
        use AudioState as S;

        let effect = match (self.state, event) {
            (S::Ended, _) => AudioEffect::None,
            (S::NotStarted, E::AutoplayStarted) => {
                self.state = S::Playing;
                AudioEffect::None
            }
            (S::NotStarted, E::AutoplayRejected) => {
                self.state = S::AutoplayBlocked;
                AudioEffect::None
            }
            (S::NotStarted | S::AutoplayBlocked, E::UserStart) => {
                self.state = S::Playing;
                AudioEffect::Play
            }
            (S::Playing, E::Progress(at)) => {
                if at > self.position {
                    self.position = at;
                }
                AudioEffect::None
            }
            (S::Playing, E::Paused) => AudioEffect::Resume,
            (S::Playing, E::Seeked(at)) if at != self.position => {
                AudioEffect::RevertSeek(self.position)
            }
            (S::Playing, E::Ended) => {
                self.state = S::Ended;
                AudioEffect::Finished
            }
            _ => AudioEffect::None,
        };
        if effect != AudioEffect::None {
            tracing::debug!(?event, ?effect, state = ?self.state, "audio gate");
        }
        effect
    }
}
