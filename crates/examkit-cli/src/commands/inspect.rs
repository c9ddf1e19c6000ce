//! The `examkit inspect` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examkit_core::answers::AnswerStore;
use examkit_core::navigation;
use examkit_core::registry::{self, Context};
use examkit_core::render::Rendered;
use examkit_core::timer::Clock;

pub fn execute(exam_path: PathBuf, render: bool) -> Result<()> {
    let exam = super::load_exam(&exam_path)?;
    let empty = AnswerStore::new();

    println!(
        "Exam: {} ({} sections, {} questions, {})",
        if exam.title.is_empty() { &exam.id } else { &exam.title },
        exam.sections.len(),
        exam.question_count(),
        Clock(exam.duration_secs()),
    );
    if let Some(audio) = exam.listening_audio() {
        println!("Audio: {audio}");
    }

    for section in &exam.sections {
        let ctx = Context::new(section, &empty);
        let parts = navigation::parts(section);
        println!();
        println!(
            "Section {} [{}]: {} questions, {} navigable{}",
            section.id,
            section.kind,
            section.questions.len(),
            navigation::visible_questions(section, None).len(),
            if parts.is_empty() {
                String::new()
            } else {
                format!(", parts {parts:?}")
            },
        );

        let mut table = Table::new();
        table.set_header(vec!["#", "Id", "Type", "Part", "View"]);
        for question in &section.questions {
            let rendered = registry::render(question, &ctx);
            table.add_row(vec![
                Cell::new(question.number),
                Cell::new(&question.id),
                Cell::new(question.kind.as_str()),
                Cell::new(
                    navigation::part_of(section, &question.id)
                        .map(|p| p.to_string())
                        .unwrap_or_default(),
                ),
                Cell::new(summarize(&rendered)),
            ]);
            if render {
                println!("{}", serde_json::to_string(&rendered)?);
            }
        }
        println!("{table}");
    }

    Ok(())
}

fn summarize(rendered: &Rendered) -> String {
    match rendered {
        Rendered::Choices {
            options,
            max_selections,
        } if *max_selections > 1 => format!("choose {max_selections} of {}", options.len()),
        Rendered::Choices { options, .. } => format!("{} options", options.len()),
        Rendered::TriState { options } => options
            .iter()
            .map(|o| o.text.as_str())
            .collect::<Vec<_>>()
            .join(" / "),
        Rendered::HeadingSlot { paragraph, .. } => match paragraph {
            Some(p) => format!("heading for paragraph {p}"),
            None => "heading".to_string(),
        },
        Rendered::Blanks { segments, .. } => {
            let inputs = segments
                .iter()
                .filter(|s| matches!(s, examkit_core::render::Segment::Input { .. }))
                .count();
            format!("{inputs} blank(s)")
        }
        Rendered::FreeText { words, .. } => match (words.min, words.max) {
            (Some(min), Some(max)) => format!("free text, {min}-{max} words"),
            (Some(min), None) => format!("free text, {min}+ words"),
            (None, Some(max)) => format!("free text, up to {max} words"),
            (None, None) => "free text".to_string(),
        },
        Rendered::TokenSlot { anchor_id, .. } => format!("slot in {anchor_id}"),
        Rendered::TokenBank { tokens, members } => {
            format!("{} tokens, {} slots", tokens.len(), members.len())
        }
        Rendered::Table { columns, rows } => format!("table {}x{}", rows.len(), columns.len()),
        Rendered::NotConfigured { reason } => format!("NOT CONFIGURED: {reason}"),
    }
}
