//! Question type registry.
//!
//! Every question kind has one handler implementing [`QuestionType`]: it
//! renders a [`Rendered`] view from the current answers and turns user
//! [`Input`] into [`Update`]s. Handlers never touch the store directly; the
//! session applies their updates, and only for keys the question owns.

mod choice;
mod grouped;
mod table;
mod text;

use serde::{Deserialize, Serialize};

use crate::answers::{AnswerKey, AnswerStore, AnswerValue};
use crate::model::{Question, QuestionKind, Section};
use crate::render::Rendered;

pub use choice::tri_state_labels;

/// A user interaction addressed to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum Input {
    /// Pick an option letter (choice, true/false, heading, token).
    Choose(String),
    /// Remove a previously picked option.
    Deselect(String),
    /// Replace free text, or the only blank.
    Text(String),
    /// Fill one blank of a multi-blank question.
    Blank { index: usize, text: String },
    /// Drop a heading onto a matching question's paragraph.
    DropHeading(String),
    /// Drop a token onto a drag-and-drop slot.
    DropToken(String),
    /// Interaction with one table cell.
    Cell {
        row: usize,
        col: usize,
        input: Box<Input>,
    },
    /// Clear everything this question owns.
    Clear,
}

/// Exclusivity group for [`Update::Exclusive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Matching questions of the section: one heading, one question.
    Headings,
    /// Slots of one drag-and-drop group, by anchor id.
    TokenGroup(String),
    /// Drag-drop cells of one table.
    TableTokens(String),
}

impl Scope {
    /// Membership test over the keys of `section`.
    pub fn matcher<'s>(&'s self, section: &'s Section) -> impl Fn(&AnswerKey) -> bool + 's {
        move |key: &AnswerKey| match (self, key) {
            (Scope::Headings, AnswerKey::Question(id)) => section
                .question(id)
                .is_some_and(|q| q.kind == QuestionKind::Matching),
            (Scope::TokenGroup(anchor), AnswerKey::Question(id)) => {
                id == anchor
                    || section
                        .question(id)
                        .is_some_and(|q| q.metadata.anchor_id.as_deref() == Some(anchor.as_str()))
            }
            (Scope::TableTokens(table), AnswerKey::Cell(cell)) => {
                cell.table_id == *table
                    && section
                        .question(table)
                        .and_then(|q| q.metadata.table.as_ref())
                        .and_then(|t| t.cell(cell.row, cell.col))
                        .is_some_and(|c| matches!(c, crate::table::CellSpec::DragDrop))
            }
            _ => false,
        }
    }
}

/// A change a handler wants applied to the answer store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Set(AnswerKey, AnswerValue),
    Clear(AnswerKey),
    Exclusive {
        scope: Scope,
        key: AnswerKey,
        value: String,
    },
}

impl Update {
    pub fn key(&self) -> &AnswerKey {
        match self {
            Update::Set(key, _) | Update::Clear(key) => key,
            Update::Exclusive { key, .. } => key,
        }
    }

    /// Set a text answer, or clear it when the text is empty.
    pub(crate) fn text(key: AnswerKey, text: &str) -> Self {
        if text.is_empty() {
            Update::Clear(key)
        } else {
            Update::Set(key, AnswerValue::Single(text.to_string()))
        }
    }
}

/// What a handler can see while rendering or encoding.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub section: &'a Section,
    pub answers: &'a AnswerStore,
}

impl<'a> Context<'a> {
    pub fn new(section: &'a Section, answers: &'a AnswerStore) -> Self {
        Self { section, answers }
    }

    /// Membership test for an exclusivity scope.
    pub fn in_scope<'s>(&'s self, scope: &'s Scope) -> impl Fn(&AnswerKey) -> bool + 's {
        scope.matcher(self.section)
    }

    pub(crate) fn single(&self, key: &AnswerKey) -> Option<&'a str> {
        self.answers.get(key).and_then(AnswerValue::as_single)
    }
}

/// Rendering and encoding for one question kind.
pub trait QuestionType: Send + Sync {
    /// Build the view for `question` from the current answers.
    fn render(&self, question: &Question, ctx: &Context<'_>) -> Rendered;

    /// Translate an input into store updates. Inputs the question can't use
    /// produce no updates.
    fn encode(&self, question: &Question, ctx: &Context<'_>, input: &Input) -> Vec<Update>;
}

static CHOICE: choice::ChoiceQuestion = choice::ChoiceQuestion;
static TRUE_FALSE: choice::TrueFalseQuestion = choice::TrueFalseQuestion;
static MATCHING: grouped::MatchingQuestion = grouped::MatchingQuestion;
static DRAG_DROP: grouped::DragDropQuestion = grouped::DragDropQuestion;
static FILL_BLANK: text::FillBlankQuestion = text::FillBlankQuestion;
static FREE_TEXT: text::FreeTextQuestion = text::FreeTextQuestion;
static SHORT_ANSWER: text::ShortAnswerQuestion = text::ShortAnswerQuestion;
static TABLE: table::TableQuestion = table::TableQuestion;
static UNKNOWN: UnknownQuestion = UnknownQuestion;

/// The handler for a question kind.
pub fn handler_for(kind: QuestionKind) -> &'static dyn QuestionType {
    match kind {
        QuestionKind::MultipleChoice | QuestionKind::MultiSelect => &CHOICE,
        QuestionKind::TrueFalse => &TRUE_FALSE,
        QuestionKind::Matching => &MATCHING,
        QuestionKind::DragDrop => &DRAG_DROP,
        QuestionKind::FillBlank => &FILL_BLANK,
        QuestionKind::Essay | QuestionKind::WritingTask1 | QuestionKind::SpeakingTask => {
            &FREE_TEXT
        }
        QuestionKind::ShortAnswer => &SHORT_ANSWER,
        QuestionKind::TableFillBlank | QuestionKind::TableDragDrop | QuestionKind::SimpleTable => {
            &TABLE
        }
        QuestionKind::Unknown => &UNKNOWN,
    }
}

/// Render any question.
pub fn render(question: &Question, ctx: &Context<'_>) -> Rendered {
    handler_for(question.kind).render(question, ctx)
}

/// Encode an input for any question. `Input::Clear` is handled uniformly.
pub fn encode(question: &Question, ctx: &Context<'_>, input: &Input) -> Vec<Update> {
    if matches!(input, Input::Clear) {
        return owned_keys(question, ctx.answers)
            .into_iter()
            .map(Update::Clear)
            .collect();
    }
    handler_for(question.kind).encode(question, ctx, input)
}

/// Keys currently stored for a question.
pub fn owned_keys(question: &Question, answers: &AnswerStore) -> Vec<AnswerKey> {
    answers
        .iter()
        .filter(|(k, _)| k.owner() == question.id)
        .map(|(k, _)| k.clone())
        .collect()
}

/// Whether `question` may write `key`.
pub fn owns(question: &Question, key: &AnswerKey) -> bool {
    match key {
        AnswerKey::Question(id) => *id == question.id,
        AnswerKey::Cell(cell) => question.kind.is_table() && cell.table_id == question.id,
    }
}

/// Questions of a kind this client does not know.
struct UnknownQuestion;

impl QuestionType for UnknownQuestion {
    fn render(&self, _question: &Question, _ctx: &Context<'_>) -> Rendered {
        Rendered::not_configured("unsupported question type")
    }

    fn encode(&self, _question: &Question, _ctx: &Context<'_>, _input: &Input) -> Vec<Update> {
        Vec::new()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::model::Section;

    /// Build a section from JSON for handler tests.
    pub fn section(json: serde_json::Value) -> Section {
        serde_json::from_value(json).expect("fixture section")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::CellKey;

    fn sample() -> Section {
        fixtures::section(serde_json::json!({
            "id": "s1",
            "type": "reading",
            "questions": [
                {"id": "m1", "number": 1, "type": "matching"},
                {"id": "m2", "number": 2, "type": "matching"},
                {"id": "q3", "number": 3, "type": "short_answer"},
                {"id": "bank", "number": 4, "type": "drag_drop", "metadata": {"tokens": ["x", "y"]}},
                {"id": "d1", "number": 5, "type": "drag_drop", "metadata": {"anchorId": "bank"}},
                {"id": "T", "number": 6, "type": "table_drag_drop",
                 "metadata": {"table": {"rows": [[{"kind": "drag_drop"}, "plain"]]}}}
            ]
        }))
    }

    #[test]
    fn scopes_select_their_groups() {
        let section = sample();
        let answers = AnswerStore::new();
        let ctx = Context::new(&section, &answers);

        let scope = Scope::Headings;
        let headings = ctx.in_scope(&scope);
        assert!(headings(&AnswerKey::question("m2")));
        assert!(!headings(&AnswerKey::question("q3")));

        let scope = Scope::TokenGroup("bank".into());
        let group = ctx.in_scope(&scope);
        assert!(group(&AnswerKey::question("d1")));
        assert!(!group(&AnswerKey::question("m1")));

        let scope = Scope::TableTokens("T".into());
        let cells = ctx.in_scope(&scope);
        assert!(cells(&AnswerKey::Cell(CellKey::new("T", 0, 0))));
        assert!(!cells(&AnswerKey::Cell(CellKey::new("T", 0, 1))));
    }

    #[test]
    fn clear_targets_every_owned_key() {
        let section = sample();
        let mut answers = AnswerStore::new();
        answers.set(AnswerKey::Cell(CellKey::new("T", 0, 0)), "x".into());
        answers.set(AnswerKey::question("q3"), "kept".into());
        let ctx = Context::new(&section, &answers);
        let table = section.question("T").unwrap();
        let updates = encode(table, &ctx, &Input::Clear);
        assert_eq!(
            updates,
            vec![Update::Clear(AnswerKey::Cell(CellKey::new("T", 0, 0)))]
        );
    }

    #[test]
    fn ownership_is_per_question() {
        let section = sample();
        let table = section.question("T").unwrap();
        let q3 = section.question("q3").unwrap();
        assert!(owns(table, &AnswerKey::Cell(CellKey::new("T", 3, 3))));
        assert!(!owns(q3, &AnswerKey::Cell(CellKey::new("q3", 0, 0))));
        assert!(!owns(q3, &AnswerKey::question("m1")));
    }

    #[test]
    fn unknown_kind_degrades_to_placeholder() {
        let section = fixtures::section(serde_json::json!({
            "id": "s1", "type": "reading",
            "questions": [{"id": "x", "number": 1, "type": "hotspot"}]
        }));
        let answers = AnswerStore::new();
        let ctx = Context::new(&section, &answers);
        let q = &section.questions[0];
        assert!(!render(q, &ctx).is_configured());
        assert!(encode(q, &ctx, &Input::Text("hi".into())).is_empty());
    }

    #[test]
    fn inputs_deserialize_from_script_json() {
        let input: Input = serde_json::from_value(serde_json::json!({
            "action": "cell",
            "value": {"row": 0, "col": 1, "input": {"action": "blank", "value": {"index": 1, "text": "y"}}}
        }))
        .unwrap();
        assert_eq!(
            input,
            Input::Cell {
                row: 0,
                col: 1,
                input: Box::new(Input::Blank {
                    index: 1,
                    text: "y".into()
                })
            }
        );
    }
}
