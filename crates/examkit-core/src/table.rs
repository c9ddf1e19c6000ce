//! Table question definition.
//!
//! Table questions (`table_fill_blank`, `table_drag_drop`, `simple_table`)
//! share one cell model. Older payloads describe cells as bare strings; those
//! are normalised on load, so the rest of the engine only sees [`CellSpec`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::model::QuestionOption;
use crate::tokens::blank_count;

/// Grid definition stored in a table question's metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    /// Column headers.
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_rows")]
    pub rows: Vec<Vec<CellSpec>>,
    /// Tokens that can be dropped into `drag_drop` cells.
    #[serde(default)]
    pub tokens: Vec<String>,
}

impl TableSpec {
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellSpec> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Width of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Number of independently answerable inputs in the grid.
    pub fn input_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .map(|cell| match cell {
                CellSpec::Text { .. } | CellSpec::Unknown => 0,
                CellSpec::FillBlank { text } => blank_count(text).max(1),
                _ => 1,
            })
            .sum()
    }
}

/// Content of one table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellSpec {
    /// Static text, not answerable.
    Text {
        #[serde(default)]
        text: String,
    },
    /// Text with zero or more inline blanks.
    FillBlank {
        #[serde(default)]
        text: String,
    },
    MultipleChoice {
        #[serde(default)]
        options: Vec<QuestionOption>,
    },
    TrueFalse,
    ShortAnswer {
        #[serde(default, rename = "maxWords", alias = "max_words")]
        max_words: Option<usize>,
    },
    /// Drop slot fed by the table's token list.
    DragDrop,
    #[serde(other)]
    Unknown,
}

impl CellSpec {
    /// Interpret a bare string cell: text with blank markers becomes an
    /// input cell, anything else is static.
    pub fn from_plain(text: String) -> Self {
        if blank_count(&text) > 0 {
            CellSpec::FillBlank { text }
        } else {
            CellSpec::Text { text }
        }
    }

    pub fn is_answerable(&self) -> bool {
        !matches!(self, CellSpec::Text { .. } | CellSpec::Unknown)
    }
}

/// A cell that is neither a string, `null` nor a valid tagged object
/// degrades to [`CellSpec::Unknown`] instead of failing the exam.
fn cell_from_value(value: Value) -> CellSpec {
    match value {
        Value::String(text) => CellSpec::from_plain(text),
        Value::Null => CellSpec::Text {
            text: String::new(),
        },
        other => serde_json::from_value(other).unwrap_or(CellSpec::Unknown),
    }
}

fn deserialize_rows<'de, D>(deserializer: D) -> Result<Vec<Vec<CellSpec>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(rows) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(rows
        .into_iter()
        .map(|row| match row {
            Value::Array(cells) => cells.into_iter().map(cell_from_value).collect(),
            _ => Vec::new(),
        })
        .collect())
}

/// Lenient reader for `metadata.table`: a definition that doesn't parse is
/// treated as missing, so only that question renders a placeholder.
pub(crate) fn deserialize_table<'de, D>(deserializer: D) -> Result<Option<TableSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => Ok(serde_json::from_value(value)
            .inspect_err(|e| tracing::warn!(error = %e, "ignoring malformed table definition"))
            .ok()),
    }
}
