pub mod encode;
pub mod init;
pub mod inspect;
pub mod segment;
pub mod take;
pub mod validate;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use examkit_core::model::Exam;

pub(crate) fn load_exam(path: &Path) -> Result<Exam> {
    let content = read_input(path)?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse exam: {}", path.display()))
}

/// Read a file, or stdin for `-`.
pub(crate) fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
