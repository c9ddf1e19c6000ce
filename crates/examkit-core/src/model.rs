//! Exam data model.
//!
//! These types mirror the exam payload returned by the exam API. They are
//! read-only for the lifetime of a session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::table::TableSpec;

/// A complete exam as fetched for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    /// Unique identifier for this exam.
    pub id: String,
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
    /// Total duration in minutes.
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    /// Single listening audio asset shared by the whole exam.
    #[serde(default)]
    pub audio_url: Option<String>,
    /// Ordered sections.
    #[serde(default)]
    pub sections: Vec<Section>,
}

fn default_duration() -> u32 {
    60
}

impl Exam {
    /// Countdown length in seconds.
    ///
    /// When exactly one section is loaded and it carries its own duration,
    /// that override wins over the exam total.
    pub fn duration_secs(&self) -> u32 {
        match self.sections.as_slice() {
            [only] => only.duration_minutes.unwrap_or(self.duration_minutes).saturating_mul(60),
            _ => self.duration_minutes.saturating_mul(60),
        }
    }

    /// The audio asset for a section, falling back to the exam-level one.
    pub fn audio_url_for(&self, section_index: usize) -> Option<&str> {
        let section = self.sections.get(section_index)?;
        if section.kind != SectionKind::Listening {
            return None;
        }
        section
            .audio_url
            .as_deref()
            .or(self.audio_url.as_deref())
    }

    /// The first audio asset any listening section would play.
    pub fn listening_audio(&self) -> Option<&str> {
        (0..self.sections.len()).find_map(|i| self.audio_url_for(i))
    }

    /// Find a question anywhere in the exam.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.sections.iter().find_map(|s| s.question(id))
    }

    /// Total number of questions across all sections.
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }
}

/// The four exam skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Reading,
    Listening,
    Writing,
    Speaking,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::Reading => write!(f, "reading"),
            SectionKind::Listening => write!(f, "listening"),
            SectionKind::Writing => write!(f, "writing"),
            SectionKind::Speaking => write!(f, "speaking"),
        }
    }
}

impl FromStr for SectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reading" => Ok(SectionKind::Reading),
            "listening" => Ok(SectionKind::Listening),
            "writing" => Ok(SectionKind::Writing),
            "speaking" => Ok(SectionKind::Speaking),
            other => Err(format!("unknown section type: {other}")),
        }
    }
}

/// One section of an exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    /// Duration override in minutes.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    /// Raw reading passage.
    #[serde(default)]
    pub passage: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    /// Headings available to matching questions in this section.
    #[serde(default)]
    pub heading_bank: Vec<QuestionOption>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Section {
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn question_by_number(&self, number: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.number == number)
    }

    /// Headings for matching questions.
    ///
    /// The section-level bank wins; otherwise the options of the first
    /// matching question that has any are used.
    pub fn heading_bank(&self) -> &[QuestionOption] {
        if !self.heading_bank.is_empty() {
            return &self.heading_bank;
        }
        self.questions
            .iter()
            .find(|q| q.kind == QuestionKind::Matching && !q.options.is_empty())
            .map(|q| q.options.as_slice())
            .unwrap_or(&[])
    }

    /// Members of the group anchored at `anchor_id`, in section order.
    pub fn group_members<'a>(&'a self, anchor_id: &'a str) -> impl Iterator<Item = &'a Question> {
        self.questions
            .iter()
            .filter(move |q| q.metadata.anchor_id.as_deref() == Some(anchor_id))
    }
}

/// A lettered option (choice, heading).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub letter: String,
    #[serde(default)]
    pub text: String,
}

/// A single question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Stable identity; the answer key for simple questions.
    pub id: String,
    /// Display number. Not necessarily contiguous.
    #[serde(default)]
    pub number: u32,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub metadata: QuestionMetadata,
}

impl Question {
    /// Rendered inline under an anchor question rather than navigated to.
    pub fn is_group_member(&self) -> bool {
        self.metadata.anchor_id.is_some()
    }
}

/// The closed set of question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    MultiSelect,
    TrueFalse,
    Matching,
    FillBlank,
    Essay,
    #[serde(rename = "writing_task1")]
    WritingTask1,
    SpeakingTask,
    ShortAnswer,
    DragDrop,
    TableFillBlank,
    TableDragDrop,
    SimpleTable,
    /// Anything the server sends that this client does not know.
    #[serde(other)]
    Unknown,
}

impl QuestionKind {
    /// Container questions whose cells are answered individually.
    pub fn is_table(self) -> bool {
        matches!(
            self,
            QuestionKind::TableFillBlank | QuestionKind::TableDragDrop | QuestionKind::SimpleTable
        )
    }

    pub fn is_free_text(self) -> bool {
        matches!(
            self,
            QuestionKind::Essay | QuestionKind::WritingTask1 | QuestionKind::SpeakingTask
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::MultiSelect => "multi_select",
            QuestionKind::TrueFalse => "true_false",
            QuestionKind::Matching => "matching",
            QuestionKind::FillBlank => "fill_blank",
            QuestionKind::Essay => "essay",
            QuestionKind::WritingTask1 => "writing_task1",
            QuestionKind::SpeakingTask => "speaking_task",
            QuestionKind::ShortAnswer => "short_answer",
            QuestionKind::DragDrop => "drag_drop",
            QuestionKind::TableFillBlank => "table_fill_blank",
            QuestionKind::TableDragDrop => "table_drag_drop",
            QuestionKind::SimpleTable => "simple_table",
            QuestionKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured extension data attached to a question.
///
/// Unrecognised keys are kept in `extra` so the payload survives untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionMetadata {
    /// Id of the anchor question this one is grouped under.
    #[serde(default)]
    pub anchor_id: Option<String>,
    /// Multiple choice allows several selections.
    #[serde(default)]
    pub multi_select: bool,
    /// How many selections a multi-select question takes.
    #[serde(default)]
    pub select_count: Option<usize>,
    #[serde(default)]
    pub min_words: Option<usize>,
    #[serde(default)]
    pub max_words: Option<usize>,
    /// Several blanks display a single question number.
    #[serde(default)]
    pub shared_number: bool,
    /// Display numbers for each blank of a multi-blank question.
    #[serde(default)]
    pub blank_numbers: Vec<u32>,
    /// Composite template with `{{n}}` references to other question numbers.
    #[serde(default)]
    pub template: Option<String>,
    /// Token bank of a drag-and-drop anchor.
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default, deserialize_with = "crate::table::deserialize_table")]
    pub table: Option<TableSpec>,
    /// Listening part (1-based).
    #[serde(default)]
    pub part: Option<u32>,
    /// Paragraph a matching question targets.
    #[serde(default)]
    pub paragraph: Option<String>,
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
