//! Structural checks over an exam payload.
//!
//! The session degrades malformed questions to placeholders at render time;
//! this module reports the same problems up front, for authors and the CLI.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::answers::AnswerStore;
use crate::model::{Exam, Question, SectionKind};
use crate::registry::{self, Context};
use crate::render::Rendered;
use crate::tokens::template_references;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub section_id: String,
    pub question_id: Option<String>,
    pub message: String,
}

impl Diagnostic {
    fn error(section_id: &str, question: Option<&Question>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            section_id: section_id.to_string(),
            question_id: question.map(|q| q.id.clone()),
            message: message.into(),
        }
    }

    fn warning(section_id: &str, question: Option<&Question>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(section_id, question, message)
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match &self.question_id {
            Some(q) => write!(f, "{level}: [{}/{q}] {}", self.section_id, self.message),
            None => write!(f, "{level}: [{}] {}", self.section_id, self.message),
        }
    }
}

/// Check every section and question. An empty result means the exam renders
/// without placeholders.
pub fn validate_exam(exam: &Exam) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut seen = HashSet::new();
    let empty = AnswerStore::new();

    if exam.sections.is_empty() {
        diagnostics.push(Diagnostic::error(&exam.id, None, "exam has no sections"));
    }

    for (index, section) in exam.sections.iter().enumerate() {
        if section.questions.is_empty() {
            diagnostics.push(Diagnostic::warning(&section.id, None, "section has no questions"));
        }
        if section.kind == SectionKind::Listening && exam.audio_url_for(index).is_none() {
            diagnostics.push(Diagnostic::warning(
                &section.id,
                None,
                "listening section has no audio",
            ));
        }

        let ctx = Context::new(section, &empty);
        for question in &section.questions {
            if !seen.insert(question.id.as_str()) {
                diagnostics.push(Diagnostic::error(
                    &section.id,
                    Some(question),
                    "duplicate question id",
                ));
            }

            if let Some(template) = &question.metadata.template {
                for number in template_references(template) {
                    let resolves = section
                        .questions
                        .iter()
                        .any(|q| q.number == number && q.id != question.id);
                    if !resolves {
                        diagnostics.push(Diagnostic::error(
                            &section.id,
                            Some(question),
                            format!("template references missing question {number}"),
                        ));
                    }
                }
            }

            if let Rendered::NotConfigured { reason } = registry::render(question, &ctx) {
                diagnostics.push(Diagnostic::error(&section.id, Some(question), reason));
            }
        }
    }

    diagnostics
}
