//! Submission encoder.
//!
//! Turns the answer store into the submission payload. Plain question keys
//! pass through; cell keys are grouped under their table question as one
//! `simple_table` record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::answers::{AnswerKey, AnswerStore, AnswerValue, MAX_CELL_BLANKS};

pub const TABLE_ANSWER_TYPE: &str = "simple_table";
pub const TABLE_ANSWER_VERSION: u32 = 1;

/// Body of `POST /exams/sessions/{id}/submit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub answers: Vec<SubmissionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub question_id: String,
    pub student_answer: StudentAnswer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StudentAnswer {
    Text(String),
    List(Vec<String>),
    Table(TableAnswer),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableAnswer {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    /// Keyed by `row_col`.
    pub cells: BTreeMap<String, CellAnswer>,
}

impl TableAnswer {
    fn new() -> Self {
        Self {
            kind: TABLE_ANSWER_TYPE.to_string(),
            version: TABLE_ANSWER_VERSION,
            cells: BTreeMap::new(),
        }
    }
}

/// One cell's answer: a scalar, or one slot per blank with `null` for blanks
/// left empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellAnswer {
    Value(String),
    Blanks(Vec<Option<String>>),
}

impl From<&AnswerValue> for StudentAnswer {
    fn from(value: &AnswerValue) -> Self {
        match value {
            AnswerValue::Single(s) => StudentAnswer::Text(s.clone()),
            AnswerValue::List(items) => StudentAnswer::List(items.clone()),
        }
    }
}

fn cell_text(value: &AnswerValue) -> String {
    match value {
        AnswerValue::Single(s) => s.clone(),
        AnswerValue::List(items) => items.join(", "),
    }
}

#[derive(Default)]
struct CellParts {
    scalar: Option<String>,
    blanks: BTreeMap<usize, String>,
}

impl CellParts {
    fn into_answer(self, table: &str, position: &str) -> CellAnswer {
        if self.blanks.is_empty() {
            return CellAnswer::Value(self.scalar.unwrap_or_default());
        }
        if self.scalar.is_some() {
            tracing::warn!(table, position, "cell has both a scalar and blank answers; keeping blanks");
        }
        let mut slots: Vec<Option<String>> = Vec::new();
        for (index, value) in self.blanks {
            if index >= MAX_CELL_BLANKS {
                tracing::warn!(table, position, index, "blank ordinal out of range; dropped");
                continue;
            }
            if slots.len() <= index {
                slots.resize(index + 1, None);
            }
            slots[index] = Some(value);
        }
        CellAnswer::Blanks(slots)
    }
}

/// Encode the store. Pure: the same store always yields the same payload.
pub fn encode_submission(store: &AnswerStore) -> SubmissionPayload {
    let mut plain: Vec<(&str, &AnswerValue)> = Vec::new();
    let mut tables: BTreeMap<&str, BTreeMap<String, CellParts>> = BTreeMap::new();

    for (key, value) in store.iter() {
        match key {
            AnswerKey::Question(id) => plain.push((id.as_str(), value)),
            AnswerKey::Cell(cell) => {
                let parts = tables
                    .entry(cell.table_id.as_str())
                    .or_default()
                    .entry(cell.position())
                    .or_default();
                match cell.blank {
                    Some(index) => {
                        parts.blanks.insert(index, cell_text(value));
                    }
                    None => parts.scalar = Some(cell_text(value)),
                }
            }
        }
    }

    let mut answers: Vec<SubmissionRecord> = plain
        .into_iter()
        .filter(|(id, _)| {
            let shadowed = tables.contains_key(id);
            if shadowed {
                tracing::warn!(question = %id, "plain answer shadowed by table cells");
            }
            !shadowed
        })
        .map(|(id, value)| SubmissionRecord {
            question_id: id.to_string(),
            student_answer: value.into(),
        })
        .collect();

    for (table_id, cells) in tables {
        let mut answer = TableAnswer::new();
        for (position, parts) in cells {
            let cell = parts.into_answer(table_id, &position);
            answer.cells.insert(position, cell);
        }
        answers.push(SubmissionRecord {
            question_id: table_id.to_string(),
            student_answer: StudentAnswer::Table(answer),
        });
    }

    SubmissionPayload { answers }
}
