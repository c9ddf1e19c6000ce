//! Table container questions. Each answerable cell is stored under its own
//! [`CellKey`]; cells with several blanks get one key per blank.

use crate::answers::{AnswerKey, AnswerValue, CellKey};
use crate::model::Question;
use crate::render::{key_string, CellSegment, CellView, Rendered};
use crate::table::{CellSpec, TableSpec};
use crate::tokens::{blank_count, tokenize, Token};

use super::choice::{canonical_tri_state, has_letter, option_views, tri_state_labels};
use super::text::exceeds;
use super::{Context, Input, QuestionType, Scope, Update};

pub(crate) struct TableQuestion;

impl TableQuestion {
    fn spec(question: &Question) -> Result<&TableSpec, &'static str> {
        match &question.metadata.table {
            None => Err("table question has no table definition"),
            Some(table) if table.rows.is_empty() => Err("table has no rows"),
            Some(table) => Ok(table),
        }
    }

    /// Tokens for drag-drop cells: the table's own list, else the question's.
    fn tokens<'a>(question: &'a Question, table: &'a TableSpec) -> &'a [String] {
        if table.tokens.is_empty() {
            &question.metadata.tokens
        } else {
            &table.tokens
        }
    }

    fn cell_view(
        question: &Question,
        ctx: &Context<'_>,
        row: usize,
        col: usize,
        cell: &CellSpec,
    ) -> CellView {
        let base = CellKey::new(&question.id, row, col);
        let value_of = |key: &CellKey| {
            ctx.single(&AnswerKey::Cell(key.clone()))
                .unwrap_or_default()
                .to_string()
        };

        match cell {
            CellSpec::Text { text } => CellView::Static { text: text.clone() },
            CellSpec::FillBlank { text } => {
                let multi = blank_count(text) >= 2;
                let mut segments: Vec<CellSegment> = tokenize(text)
                    .into_iter()
                    .map(|token| match token {
                        Token::Text(text) => CellSegment::Text(text),
                        Token::Blank { index, .. } => {
                            let key = if multi {
                                base.clone().with_blank(index)
                            } else {
                                base.clone()
                            };
                            CellSegment::Input {
                                value: value_of(&key),
                                key: key_string(&AnswerKey::Cell(key)),
                            }
                        }
                    })
                    .collect();
                if blank_count(text) == 0 {
                    segments.push(CellSegment::Input {
                        value: value_of(&base),
                        key: key_string(&AnswerKey::Cell(base.clone())),
                    });
                }
                CellView::Blanks { segments }
            }
            CellSpec::MultipleChoice { options } if options.is_empty() => CellView::NotConfigured,
            CellSpec::MultipleChoice { options } => {
                let selected = ctx.single(&AnswerKey::Cell(base.clone())).map(str::to_string);
                CellView::Choice {
                    key: key_string(&AnswerKey::Cell(base)),
                    options: option_views(options, selected.as_slice()),
                }
            }
            CellSpec::TrueFalse => {
                let selected = ctx.single(&AnswerKey::Cell(base.clone())).map(str::to_string);
                let labels = tri_state_labels(&[]);
                let options = labels
                    .into_iter()
                    .map(|label| crate::model::QuestionOption {
                        text: label.clone(),
                        letter: label,
                    })
                    .collect::<Vec<_>>();
                CellView::Choice {
                    key: key_string(&AnswerKey::Cell(base)),
                    options: option_views(&options, selected.as_slice()),
                }
            }
            CellSpec::ShortAnswer { max_words } => CellView::Text {
                value: value_of(&base),
                key: key_string(&AnswerKey::Cell(base)),
                max_words: *max_words,
            },
            CellSpec::DragDrop => CellView::Slot {
                assigned: ctx.single(&AnswerKey::Cell(base.clone())).map(str::to_string),
                key: key_string(&AnswerKey::Cell(base)),
            },
            CellSpec::Unknown => CellView::NotConfigured,
        }
    }
}

impl QuestionType for TableQuestion {
    fn render(&self, question: &Question, ctx: &Context<'_>) -> Rendered {
        let table = match Self::spec(question) {
            Ok(table) => table,
            Err(reason) => return Rendered::not_configured(reason),
        };
        let rows = table
            .rows
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(|(c, cell)| Self::cell_view(question, ctx, r, c, cell))
                    .collect()
            })
            .collect();
        Rendered::Table {
            columns: table.columns.clone(),
            rows,
        }
    }

    fn encode(&self, question: &Question, _ctx: &Context<'_>, input: &Input) -> Vec<Update> {
        let Input::Cell { row, col, input } = input else {
            return Vec::new();
        };
        let Ok(table) = Self::spec(question) else {
            return Vec::new();
        };
        let Some(cell) = table.cell(*row, *col) else {
            tracing::debug!(question = %question.id, row, col, "input for a cell outside the table");
            return Vec::new();
        };
        let base = CellKey::new(&question.id, *row, *col);

        match (cell, &**input) {
            (CellSpec::FillBlank { text }, input) => {
                let blanks = blank_count(text);
                let cap = question.metadata.max_words;
                match input {
                    Input::Blank { index, text } if blanks >= 2 && *index < blanks => {
                        if exceeds(text, cap) {
                            return Vec::new();
                        }
                        vec![Update::text(AnswerKey::Cell(base.with_blank(*index)), text)]
                    }
                    Input::Text(text) | Input::Blank { index: 0, text } if blanks < 2 => {
                        if exceeds(text, cap) {
                            return Vec::new();
                        }
                        vec![Update::text(AnswerKey::Cell(base), text)]
                    }
                    _ => Vec::new(),
                }
            }
            (CellSpec::MultipleChoice { options }, Input::Choose(letter)) => {
                if !has_letter(options, letter) {
                    return Vec::new();
                }
                vec![Update::Set(AnswerKey::Cell(base), AnswerValue::single(letter.as_str()))]
            }
            (CellSpec::TrueFalse, Input::Choose(value)) => match canonical_tri_state(&[], value) {
                Some(label) => vec![Update::Set(AnswerKey::Cell(base), AnswerValue::Single(label))],
                None => Vec::new(),
            },
            (CellSpec::ShortAnswer { max_words }, Input::Text(text)) => {
                if exceeds(text, *max_words) {
                    return Vec::new();
                }
                vec![Update::text(AnswerKey::Cell(base), text)]
            }
            (CellSpec::DragDrop, Input::DropToken(token) | Input::Choose(token)) => {
                if !Self::tokens(question, table).contains(token) {
                    tracing::debug!(question = %question.id, %token, "token not in table bank");
                    return Vec::new();
                }
                vec![Update::Exclusive {
                    scope: Scope::TableTokens(question.id.clone()),
                    key: AnswerKey::Cell(base),
                    value: token.clone(),
                }]
            }
            (cell, Input::Deselect(_)) if cell.is_answerable() => {
                vec![Update::Clear(AnswerKey::Cell(base))]
            }
            _ => Vec::new(),
        }
    }
}
