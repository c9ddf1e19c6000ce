//! The `examkit validate` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use examkit_core::validate::{validate_exam, Severity};

pub fn execute(exam_path: PathBuf) -> Result<()> {
    let files = if exam_path.is_dir() {
        exam_files(&exam_path)?
    } else {
        vec![exam_path]
    };

    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let exam = super::load_exam(file)?;
        println!(
            "Exam: {} ({} sections, {} questions)",
            exam.id,
            exam.sections.len(),
            exam.question_count()
        );

        for diagnostic in validate_exam(&exam) {
            println!("  {diagnostic}");
            match diagnostic.severity {
                Severity::Error => total_errors += 1,
                Severity::Warning => total_warnings += 1,
            }
        }
    }

    if total_errors == 0 && total_warnings == 0 {
        println!("All exams valid.");
    } else {
        println!("\n{total_errors} error(s), {total_warnings} warning(s) found.");
    }
    anyhow::ensure!(total_errors == 0, "{total_errors} malformed question(s)");

    Ok(())
}

fn exam_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    anyhow::ensure!(!files.is_empty(), "no exam files in {}", dir.display());
    Ok(files)
}
