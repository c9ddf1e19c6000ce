//! Presentation-neutral view model produced by question handlers.
//!
//! A GUI draws these; the CLI prints them. Nothing here knows about styling.

use serde::Serialize;

use crate::answers::AnswerKey;

/// What a question offers the test-taker right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Rendered {
    Choices {
        options: Vec<ChoiceView>,
        /// 1 for single choice.
        max_selections: usize,
    },
    TriState {
        options: Vec<ChoiceView>,
    },
    /// A paragraph drop target for a heading.
    HeadingSlot {
        paragraph: Option<String>,
        assigned: Option<String>,
        /// Headings not yet used anywhere in the section.
        available: Vec<String>,
    },
    Blanks {
        label: NumberLabel,
        segments: Vec<Segment>,
    },
    FreeText {
        text: String,
        words: WordCount,
    },
    /// A member slot of a drag-and-drop group.
    TokenSlot {
        anchor_id: String,
        assigned: Option<String>,
        available: Vec<String>,
    },
    /// The anchor of a drag-and-drop group: its token bank and member slots.
    TokenBank {
        tokens: Vec<TokenView>,
        members: Vec<String>,
    },
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<CellView>>,
    },
    /// Diagnostic placeholder for a question whose structure can't be used.
    NotConfigured {
        reason: String,
    },
}

impl Rendered {
    pub fn not_configured(reason: impl Into<String>) -> Self {
        Rendered::NotConfigured {
            reason: reason.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, Rendered::NotConfigured { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceView {
    pub letter: String,
    pub text: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenView {
    pub token: String,
    /// Member question currently holding the token.
    pub held_by: Option<String>,
}

/// Display numbering of a blank-bearing question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NumberLabel {
    Single(u32),
    Each(Vec<u32>),
}

/// One piece of a blank-bearing text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Text {
        text: String,
    },
    Input {
        /// Question that receives input typed here.
        target: String,
        /// Blank ordinal within `target`, when it has several.
        blank: Option<usize>,
        number: Option<u32>,
        value: String,
    },
    /// Template reference to a question number that doesn't exist.
    Missing {
        reference: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellView {
    Static {
        text: String,
    },
    Blanks {
        segments: Vec<CellSegment>,
    },
    Choice {
        key: String,
        options: Vec<ChoiceView>,
    },
    Text {
        key: String,
        value: String,
        max_words: Option<usize>,
    },
    Slot {
        key: String,
        assigned: Option<String>,
    },
    NotConfigured,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CellSegment {
    Text(String),
    Input { key: String, value: String },
}

/// Word-count feedback for free-text answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub count: usize,
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub status: WordStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WordStatus {
    Under,
    Within,
    Over,
}

impl WordCount {
    pub fn measure(text: &str, min: Option<usize>, max: Option<usize>) -> Self {
        let count = count_words(text);
        let status = match (min, max) {
            (Some(min), _) if count < min => WordStatus::Under,
            (_, Some(max)) if count > max => WordStatus::Over,
            _ => WordStatus::Within,
        };
        Self {
            count,
            min,
            max,
            status,
        }
    }
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Flat key form used by view models.
pub(crate) fn key_string(key: &AnswerKey) -> String {
    key.to_string()
}
