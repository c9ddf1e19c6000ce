//! Answer store.
//!
//! Maps an [`AnswerKey`] (a question id or a synthetic table-cell key) to an
//! [`AnswerValue`]. Every mutation in a session goes through [`AnswerStore::set`],
//! [`AnswerStore::clear`] or [`AnswerStore::assign_exclusive`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static CELL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<table>.+?)_(?P<row>\d+)_(?P<col>\d+)(?:_b(?P<blank>\d+))?$")
        .expect("cell key pattern is valid")
});

/// Upper bound on blank ordinals in a cell key. Larger ordinals are not
/// read as cell keys.
pub const MAX_CELL_BLANKS: usize = 64;

/// Address of one answerable cell of a table question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub table_id: String,
    pub row: usize,
    pub col: usize,
    /// Blank ordinal for cells holding several blanks.
    pub blank: Option<usize>,
}

impl CellKey {
    pub fn new(table_id: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            table_id: table_id.into(),
            row,
            col,
            blank: None,
        }
    }

    pub fn with_blank(mut self, blank: usize) -> Self {
        self.blank = Some(blank);
        self
    }

    /// `row_col` position used in the submission cell map.
    pub fn position(&self) -> String {
        format!("{}_{}", self.row, self.col)
    }
}

/// Key into the answer store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnswerKey {
    Question(String),
    Cell(CellKey),
}

impl AnswerKey {
    pub fn question(id: impl Into<String>) -> Self {
        AnswerKey::Question(id.into())
    }

    /// Parse a flat string key by shape alone.
    ///
    /// `T_0_1_b0` and `T_1_0` become cell keys of table `T`; anything else is
    /// a question id.
    pub fn parse(raw: &str) -> Self {
        Self::parse_with(raw, |_| true)
    }

    /// Parse a flat string key, treating it as a cell key only when
    /// `is_table` accepts the table id. Keeps question ids such as `q_1_2`
    /// intact when the exam has no table `q`.
    pub fn parse_with(raw: &str, is_table: impl Fn(&str) -> bool) -> Self {
        let Some(caps) = CELL_KEY.captures(raw) else {
            return AnswerKey::Question(raw.to_string());
        };
        let table = caps.name("table").map(|m| m.as_str()).unwrap_or_default();
        let row = caps.name("row").and_then(|m| m.as_str().parse().ok());
        let col = caps.name("col").and_then(|m| m.as_str().parse().ok());
        let blank = match caps.name("blank").map(|m| m.as_str().parse::<usize>()) {
            None => None,
            Some(Ok(index)) if index < MAX_CELL_BLANKS => Some(index),
            Some(_) => return AnswerKey::Question(raw.to_string()),
        };
        match (row, col) {
            (Some(row), Some(col)) if is_table(table) => AnswerKey::Cell(CellKey {
                table_id: table.to_string(),
                row,
                col,
                blank,
            }),
            _ => AnswerKey::Question(raw.to_string()),
        }
    }

    /// The question that owns this key.
    pub fn owner(&self) -> &str {
        match self {
            AnswerKey::Question(id) => id,
            AnswerKey::Cell(cell) => &cell.table_id,
        }
    }

    pub fn as_cell(&self) -> Option<&CellKey> {
        match self {
            AnswerKey::Cell(cell) => Some(cell),
            AnswerKey::Question(_) => None,
        }
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerKey::Question(id) => f.write_str(id),
            AnswerKey::Cell(cell) => {
                write!(f, "{}_{}_{}", cell.table_id, cell.row, cell.col)?;
                if let Some(blank) = cell.blank {
                    write!(f, "_b{blank}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for AnswerKey {
    fn from(raw: &str) -> Self {
        AnswerKey::parse(raw)
    }
}

/// A stored answer: one string, or an ordered list for multi-blank and
/// multi-select questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Single(String),
    List(Vec<String>),
}

impl AnswerValue {
    pub fn single(value: impl Into<String>) -> Self {
        AnswerValue::Single(value.into())
    }

    pub fn as_single(&self) -> Option<&str> {
        match self {
            AnswerValue::Single(s) => Some(s),
            AnswerValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AnswerValue::List(items) => Some(items),
            AnswerValue::Single(_) => None,
        }
    }

    /// Exact-match membership used for "already used" tracking.
    pub fn holds(&self, value: &str) -> bool {
        match self {
            AnswerValue::Single(s) => s == value,
            AnswerValue::List(items) => items.iter().any(|i| i == value),
        }
    }

    /// Whether anything has actually been entered.
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Single(s) => s.trim().is_empty(),
            AnswerValue::List(items) => items.iter().all(|i| i.trim().is_empty()),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Single(value.to_string())
    }
}

/// The answer store for one session.
#[derive(Debug, Clone, Default)]
pub struct AnswerStore {
    entries: BTreeMap<AnswerKey, AnswerValue>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from flat string keys, parsing each key once.
    pub fn from_flat<I>(entries: I, is_table: impl Fn(&str) -> bool) -> Self
    where
        I: IntoIterator<Item = (String, AnswerValue)>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (AnswerKey::parse_with(&k, &is_table), v))
            .collect();
        Self { entries }
    }

    /// Flat string-keyed view, e.g. for saving a draft.
    pub fn to_flat(&self) -> BTreeMap<String, AnswerValue> {
        self.entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Set `key`, overwriting any previous value. Returns the previous value.
    pub fn set(&mut self, key: AnswerKey, value: AnswerValue) -> Option<AnswerValue> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &AnswerKey) -> Option<&AnswerValue> {
        self.entries.get(key)
    }

    /// Convenience lookup for a plain question id.
    pub fn get_question(&self, id: &str) -> Option<&AnswerValue> {
        self.entries.get(&AnswerKey::Question(id.to_string()))
    }

    /// Remove the given keys. Returns how many were present.
    pub fn clear(&mut self, keys: &[AnswerKey]) -> usize {
        keys.iter()
            .filter(|k| self.entries.remove(*k).is_some())
            .count()
    }

    /// Give `value` to `key` and take it away from every other key in the
    /// group. Returns the keys that lost the value.
    pub fn assign_exclusive(
        &mut self,
        in_group: impl Fn(&AnswerKey) -> bool,
        key: AnswerKey,
        value: &str,
    ) -> Vec<AnswerKey> {
        let evicted: Vec<AnswerKey> = self
            .entries
            .iter()
            .filter(|(k, v)| **k != key && in_group(*k) && v.holds(value))
            .map(|(k, _)| k.clone())
            .collect();
        for k in &evicted {
            self.entries.remove(k);
        }
        self.entries.insert(key, AnswerValue::Single(value.to_string()));
        evicted
    }

    /// The key in the group currently holding `value`, if any.
    pub fn holder_of(
        &self,
        in_group: impl Fn(&AnswerKey) -> bool,
        value: &str,
    ) -> Option<&AnswerKey> {
        self.entries
            .iter()
            .find(|(k, v)| in_group(*k) && v.holds(value))
            .map(|(k, _)| k)
    }

    /// All cell entries of one table question.
    pub fn cells_of<'a>(
        &'a self,
        table_id: &'a str,
    ) -> impl Iterator<Item = (&'a CellKey, &'a AnswerValue)> {
        self.entries.iter().filter_map(move |(k, v)| match k {
            AnswerKey::Cell(cell) if cell.table_id == table_id => Some((cell, v)),
            _ => None,
        })
    }

    /// Whether a question has any non-blank answer (for tables: any cell).
    pub fn is_answered(&self, question_id: &str) -> bool {
        self.entries
            .iter()
            .any(|(k, v)| k.owner() == question_id && !v.is_blank())
    }

    /// Drop every entry. Only the explicit reset action calls this.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AnswerKey, &AnswerValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_cell_keys_by_shape() {
        assert_eq!(
            AnswerKey::parse("T_0_1_b0"),
            AnswerKey::Cell(CellKey::new("T", 0, 1).with_blank(0))
        );
        assert_eq!(
            AnswerKey::parse("table_7_12_3"),
            AnswerKey::Cell(CellKey::new("table_7", 12, 3))
        );
        assert_eq!(AnswerKey::parse("Q5"), AnswerKey::question("Q5"));
        assert_eq!(AnswerKey::parse("q_1"), AnswerKey::question("q_1"));
    }

    #[test]
    fn table_aware_parse_keeps_plain_ids() {
        let key = AnswerKey::parse_with("q_1_2", |id| id == "T");
        assert_eq!(key, AnswerKey::question("q_1_2"));
        let key = AnswerKey::parse_with("T_1_2", |id| id == "T");
        assert_eq!(key.owner(), "T");
    }

    #[test]
    fn oversized_blank_ordinals_are_not_cell_keys() {
        for raw in ["T_0_0_b18446744073709551615", "T_0_0_b99999999999999999999", "T_0_0_b64"] {
            assert_eq!(AnswerKey::parse_with(raw, |id| id == "T"), AnswerKey::question(raw));
        }
        assert_eq!(
            AnswerKey::parse("T_0_0_b63"),
            AnswerKey::Cell(CellKey::new("T", 0, 0).with_blank(MAX_CELL_BLANKS - 1))
        );
    }

    #[test]
    fn display_round_trips_flat_form() {
        for raw in ["T_0_1_b0", "T_1_0", "Q5"] {
            assert_eq!(AnswerKey::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn set_overwrites() {
        let mut store = AnswerStore::new();
        store.set(AnswerKey::question("q1"), "A".into());
        let prev = store.set(AnswerKey::question("q1"), "B".into());
        assert_eq!(prev, Some(AnswerValue::single("A")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_question("q1"), Some(&AnswerValue::single("B")));
    }

    #[test]
    fn clear_removes_only_named_keys() {
        let mut store = AnswerStore::new();
        store.set(AnswerKey::question("q1"), "A".into());
        store.set(AnswerKey::question("q2"), "B".into());
        assert_eq!(
            store.clear(&[AnswerKey::question("q1"), AnswerKey::question("zz")]),
            1
        );
        assert!(store.get_question("q1").is_none());
        assert!(store.get_question("q2").is_some());
    }

    #[test]
    fn exclusive_assignment_moves_value() {
        let mut store = AnswerStore::new();
        let all = |_: &AnswerKey| true;
        store.assign_exclusive(all, AnswerKey::question("q1"), "iii");
        let evicted = store.assign_exclusive(all, AnswerKey::question("q2"), "iii");
        assert_eq!(evicted, vec![AnswerKey::question("q1")]);
        assert!(store.get_question("q1").is_none());
        assert_eq!(store.holder_of(all, "iii"), Some(&AnswerKey::question("q2")));
    }

    #[test]
    fn exclusive_assignment_respects_group() {
        let mut store = AnswerStore::new();
        store.set(AnswerKey::question("other"), "iii".into());
        let group = |k: &AnswerKey| k.owner().starts_with('m');
        store.assign_exclusive(group, AnswerKey::question("m1"), "iii");
        assert_eq!(store.get_question("other"), Some(&AnswerValue::single("iii")));
    }

    #[test]
    fn answered_counts_cells_for_their_table() {
        let mut store = AnswerStore::new();
        store.set(AnswerKey::Cell(CellKey::new("T", 0, 0)), "x".into());
        store.set(AnswerKey::question("q1"), "  ".into());
        assert!(store.is_answered("T"));
        assert!(!store.is_answered("q1"));
        assert_eq!(store.cells_of("T").count(), 1);
    }

    #[test]
    fn flat_view_round_trips() {
        let mut store = AnswerStore::new();
        store.set(AnswerKey::Cell(CellKey::new("T", 0, 1).with_blank(1)), "y".into());
        store.set(AnswerKey::question("Q5"), AnswerValue::List(vec!["A".into(), "C".into()]));
        let flat = store.to_flat();
        let back = AnswerStore::from_flat(flat, |id| id == "T");
        assert_eq!(back.to_flat(), store.to_flat());
    }

    proptest! {
        #[test]
        fn at_most_one_holder_per_value(assignments in proptest::collection::vec((0usize..6, 0usize..4), 1..40)) {
            let mut store = AnswerStore::new();
            let values = ["i", "ii", "iii", "iv"];
            let all = |_: &AnswerKey| true;
            for (q, v) in assignments {
                store.assign_exclusive(all, AnswerKey::question(format!("q{q}")), values[v]);
                for value in values {
                    let holders = store.iter().filter(|(_, held)| held.holds(value)).count();
                    prop_assert!(holders <= 1);
                }
            }
        }
    }
}
