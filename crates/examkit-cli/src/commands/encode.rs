//! The `examkit encode` command.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

use examkit_core::answers::{AnswerStore, AnswerValue};
use examkit_core::encoder::encode_submission;

pub fn execute(exam_path: PathBuf, answers_path: PathBuf) -> Result<()> {
    let exam = super::load_exam(&exam_path)?;
    let content = super::read_input(&answers_path)?;
    let flat: BTreeMap<String, AnswerValue> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse answers: {}", answers_path.display()))?;

    let is_table = |id: &str| exam.question(id).is_some_and(|q| q.kind.is_table());
    let store = AnswerStore::from_flat(flat, is_table);
    let payload = encode_submission(&store);

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
