//! Navigation controller.
//!
//! Tracks `(section, index)` over the visible-question list of each section.
//! The list is derived, never stored: group members render under their
//! anchor and matching questions live in the side panel, so neither is
//! navigable. Listening sections can additionally be filtered to one part.

use serde::Serialize;

use crate::model::{Exam, Question, QuestionKind, Section, SectionKind};

/// Questions per listening part when the payload doesn't say.
pub const PART_SIZE: usize = 10;

/// Where the test-taker is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub section: usize,
    pub index: usize,
}

fn navigable(q: &Question) -> bool {
    !q.is_group_member() && q.kind != QuestionKind::Matching
}

/// Navigable questions of a section with their listening part number.
fn with_parts(section: &Section) -> impl Iterator<Item = (&Question, u32)> {
    section
        .questions
        .iter()
        .filter(|q| navigable(q))
        .enumerate()
        .map(|(i, q)| {
            let part = q.metadata.part.unwrap_or((i / PART_SIZE) as u32 + 1);
            (q, part)
        })
}

/// The visible-question list, optionally restricted to one listening part.
/// The part filter only applies to listening sections.
pub fn visible_questions(section: &Section, part: Option<u32>) -> Vec<&Question> {
    let filter = part.filter(|_| section.kind == SectionKind::Listening);
    with_parts(section)
        .filter(|(_, p)| filter.map_or(true, |wanted| *p == wanted))
        .map(|(q, _)| q)
        .collect()
}

/// Distinct part numbers of a listening section, ascending. Empty for
/// other sections.
pub fn parts(section: &Section) -> Vec<u32> {
    if section.kind != SectionKind::Listening {
        return Vec::new();
    }
    let mut parts: Vec<u32> = with_parts(section).map(|(_, p)| p).collect();
    parts.sort_unstable();
    parts.dedup();
    parts
}

/// Part a question belongs to, if it is navigable in a listening section.
pub fn part_of(section: &Section, question_id: &str) -> Option<u32> {
    if section.kind != SectionKind::Listening {
        return None;
    }
    with_parts(section)
        .find(|(q, _)| q.id == question_id)
        .map(|(_, p)| p)
}

#[derive(Debug, Clone, Default)]
pub struct Navigator {
    section: usize,
    index: usize,
    part: Option<u32>,
}

impl Navigator {
    /// Start at the first visible question of the exam.
    pub fn new(exam: &Exam) -> Self {
        let section = exam
            .sections
            .iter()
            .position(|s| !visible_questions(s, None).is_empty())
            .unwrap_or(0);
        Self {
            section,
            index: 0,
            part: None,
        }
    }

    pub fn position(&self) -> Position {
        Position {
            section: self.section,
            index: self.index,
        }
    }

    pub fn part(&self) -> Option<u32> {
        self.part
    }

    pub fn section<'e>(&self, exam: &'e Exam) -> Option<&'e Section> {
        exam.sections.get(self.section)
    }

    /// The current visible list.
    pub fn visible<'e>(&self, exam: &'e Exam) -> Vec<&'e Question> {
        self.section(exam)
            .map(|s| visible_questions(s, self.part))
            .unwrap_or_default()
    }

    pub fn current<'e>(&self, exam: &'e Exam) -> Option<&'e Question> {
        self.visible(exam).get(self.index).copied()
    }

    /// Advance, rolling into the next listening part when a part filter is
    /// active, then into the next non-empty section. Returns whether the
    /// position changed.
    pub fn next(&mut self, exam: &Exam) -> bool {
        if self.index + 1 < self.visible(exam).len() {
            self.index += 1;
            return true;
        }
        if let Some(part) = self.adjacent_part(exam, true) {
            self.part = Some(part);
            self.index = 0;
            return true;
        }
        let target = exam
            .sections
            .iter()
            .enumerate()
            .skip(self.section + 1)
            .find(|(_, s)| !visible_questions(s, None).is_empty())
            .map(|(i, _)| i);
        match target {
            Some(section) => {
                self.enter(section, 0);
                true
            }
            None => false,
        }
    }

    /// Mirror of [`Navigator::next`]: rolls into the previous section's last
    /// visible question.
    pub fn previous(&mut self, exam: &Exam) -> bool {
        if self.index > 0 {
            self.index -= 1;
            return true;
        }
        if let Some(part) = self.adjacent_part(exam, false) {
            self.part = Some(part);
            self.index = self.visible(exam).len().saturating_sub(1);
            return true;
        }
        let target = exam
            .sections
            .iter()
            .enumerate()
            .take(self.section)
            .rev()
            .find_map(|(i, s)| {
                let len = visible_questions(s, None).len();
                (len > 0).then_some((i, len - 1))
            });
        match target {
            Some((section, index)) => {
                self.enter(section, index);
                true
            }
            None => false,
        }
    }

    /// Move to a navigable question by id. Switches the part filter when
    /// the question sits in another part.
    pub fn jump_to(&mut self, exam: &Exam, question_id: &str) -> bool {
        for (s, section) in exam.sections.iter().enumerate() {
            let Some(index) = visible_questions(section, None)
                .iter()
                .position(|q| q.id == question_id)
            else {
                continue;
            };
            self.section = s;
            self.part = if self.part.is_some() {
                part_of(section, question_id)
            } else {
                None
            };
            self.index = visible_questions(section, self.part)
                .iter()
                .position(|q| q.id == question_id)
                .unwrap_or(index);
            return true;
        }
        tracing::debug!(question = question_id, "jump target is not navigable");
        false
    }

    /// Change the listening part filter and re-derive the visible list.
    pub fn set_part(&mut self, exam: &Exam, part: Option<u32>) {
        self.part = part;
        self.recompute(exam);
    }

    /// Re-derive the visible list and clamp the index into it.
    pub fn recompute(&mut self, exam: &Exam) {
        if self.section >= exam.sections.len() {
            self.section = exam.sections.len().saturating_sub(1);
        }
        let len = self.visible(exam).len();
        let clamped = self.index.min(len.saturating_sub(1));
        if clamped != self.index {
            tracing::debug!(from = self.index, to = clamped, "clamped question index");
            self.index = clamped;
        }
    }

    /// The part after (or before) the active part filter in this section.
    fn adjacent_part(&self, exam: &Exam, forward: bool) -> Option<u32> {
        let current = self.part?;
        let parts = parts(self.section(exam)?);
        if forward {
            parts.into_iter().find(|p| *p > current)
        } else {
            parts.into_iter().rev().find(|p| *p < current)
        }
    }

    fn enter(&mut self, section: usize, index: usize) {
        self.section = section;
        self.index = index;
        self.part = None;
    }
}
