//! Handlers whose answers are exclusive within a group: matching headings and
//! drag-and-drop tokens.

use crate::answers::AnswerKey;
use crate::model::{Question, QuestionKind, Section};
use crate::passage::segment;
use crate::render::{Rendered, TokenView};

use super::choice::has_letter;
use super::{Context, Input, QuestionType, Scope, Update};

pub(crate) struct MatchingQuestion;

impl MatchingQuestion {
    /// The paragraph this question's drop target sits on.
    fn paragraph(question: &Question, section: &Section) -> Option<String> {
        if let Some(paragraph) = &question.metadata.paragraph {
            return Some(paragraph.clone());
        }
        let position = section
            .questions
            .iter()
            .filter(|q| q.kind == QuestionKind::Matching)
            .position(|q| q.id == question.id)?;
        let passage = section.passage.as_deref().unwrap_or_default();
        segment(passage)
            .into_iter()
            .filter_map(|p| p.anchor)
            .nth(position)
            .map(|anchor| anchor.to_string())
    }
}

impl QuestionType for MatchingQuestion {
    fn render(&self, question: &Question, ctx: &Context<'_>) -> Rendered {
        let bank = ctx.section.heading_bank();
        if bank.is_empty() {
            return Rendered::not_configured("no heading bank for matching question");
        }
        let scope = Scope::Headings;
        let in_group = ctx.in_scope(&scope);
        let available = bank
            .iter()
            .filter(|h| ctx.answers.holder_of(&in_group, &h.letter).is_none())
            .map(|h| h.letter.clone())
            .collect();
        Rendered::HeadingSlot {
            paragraph: Self::paragraph(question, ctx.section),
            assigned: ctx
                .single(&AnswerKey::question(&question.id))
                .map(str::to_string),
            available,
        }
    }

    fn encode(&self, question: &Question, ctx: &Context<'_>, input: &Input) -> Vec<Update> {
        let key = AnswerKey::question(&question.id);
        match input {
            Input::DropHeading(letter) | Input::Choose(letter) => {
                if !has_letter(ctx.section.heading_bank(), letter) {
                    tracing::debug!(question = %question.id, %letter, "heading not in bank");
                    return Vec::new();
                }
                vec![Update::Exclusive {
                    scope: Scope::Headings,
                    key,
                    value: letter.clone(),
                }]
            }
            Input::Deselect(_) => vec![Update::Clear(key)],
            _ => Vec::new(),
        }
    }
}

pub(crate) struct DragDropQuestion;

/// Where a drag-and-drop question sits in its group.
enum Role<'a> {
    /// Anchor with member slots: shows the bank, takes no input itself.
    Bank { tokens: &'a [String] },
    /// A slot fed by the bank of `anchor`.
    Slot {
        anchor: &'a str,
        tokens: &'a [String],
    },
}

impl DragDropQuestion {
    fn role<'a>(question: &'a Question, section: &'a Section) -> Result<Role<'a>, &'static str> {
        match &question.metadata.anchor_id {
            Some(anchor_id) => {
                let anchor = section
                    .question(anchor_id)
                    .ok_or("drag-and-drop anchor question is missing")?;
                if anchor.metadata.tokens.is_empty() {
                    return Err("drag-and-drop anchor has no tokens");
                }
                Ok(Role::Slot {
                    anchor: &anchor.id,
                    tokens: &anchor.metadata.tokens,
                })
            }
            None if question.metadata.tokens.is_empty() => Err("drag-and-drop question has no tokens"),
            None if section.group_members(&question.id).next().is_some() => Ok(Role::Bank {
                tokens: &question.metadata.tokens,
            }),
            // No members: the anchor is its own slot.
            None => Ok(Role::Slot {
                anchor: &question.id,
                tokens: &question.metadata.tokens,
            }),
        }
    }
}

impl QuestionType for DragDropQuestion {
    fn render(&self, question: &Question, ctx: &Context<'_>) -> Rendered {
        let role = match Self::role(question, ctx.section) {
            Ok(role) => role,
            Err(reason) => return Rendered::not_configured(reason),
        };
        match role {
            Role::Bank { tokens } => {
                let scope = Scope::TokenGroup(question.id.clone());
                let in_group = ctx.in_scope(&scope);
                Rendered::TokenBank {
                    tokens: tokens
                        .iter()
                        .map(|token| TokenView {
                            token: token.clone(),
                            held_by: ctx
                                .answers
                                .holder_of(&in_group, token)
                                .map(|k| k.owner().to_string()),
                        })
                        .collect(),
                    members: ctx
                        .section
                        .group_members(&question.id)
                        .map(|m| m.id.clone())
                        .collect(),
                }
            }
            Role::Slot { anchor, tokens } => {
                let scope = Scope::TokenGroup(anchor.to_string());
                let in_group = ctx.in_scope(&scope);
                Rendered::TokenSlot {
                    anchor_id: anchor.to_string(),
                    assigned: ctx
                        .single(&AnswerKey::question(&question.id))
                        .map(str::to_string),
                    available: tokens
                        .iter()
                        .filter(|t| ctx.answers.holder_of(&in_group, t).is_none())
                        .cloned()
                        .collect(),
                }
            }
        }
    }

    fn encode(&self, question: &Question, ctx: &Context<'_>, input: &Input) -> Vec<Update> {
        let Ok(Role::Slot { anchor, tokens }) = Self::role(question, ctx.section) else {
            return Vec::new();
        };
        let key = AnswerKey::question(&question.id);
        match input {
            Input::DropToken(token) | Input::Choose(token) => {
                if !tokens.contains(token) {
                    tracing::debug!(question = %question.id, %token, "token not in bank");
                    return Vec::new();
                }
                vec![Update::Exclusive {
                    scope: Scope::TokenGroup(anchor.to_string()),
                    key,
                    value: token.clone(),
                }]
            }
            Input::Deselect(_) => vec![Update::Clear(key)],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::{AnswerStore, AnswerValue};
    use crate::registry::{encode, fixtures, render};

    fn section() -> Section {
        fixtures::section(serde_json::json!({
            "id": "r1",
            "type": "reading",
            "passage": "A\nFirst paragraph.\n\nB\nSecond paragraph.\n\nC\nThird paragraph.",
            "headingBank": [
                {"letter": "i", "text": "Origins"},
                {"letter": "ii", "text": "Decline"},
                {"letter": "iii", "text": "Revival"}
            ],
            "questions": [
                {"id": "h1", "number": 1, "type": "matching"},
                {"id": "h2", "number": 2, "type": "matching"},
                {"id": "h3", "number": 3, "type": "matching", "metadata": {"paragraph": "Z"}},
                {"id": "bank", "number": 10, "type": "drag_drop", "metadata": {"tokens": ["red", "blue"]}},
                {"id": "d1", "number": 11, "type": "drag_drop", "metadata": {"anchorId": "bank"}},
                {"id": "d2", "number": 12, "type": "drag_drop", "metadata": {"anchorId": "bank"}},
                {"id": "orphan", "number": 13, "type": "drag_drop", "metadata": {"anchorId": "gone"}},
                {"id": "solo", "number": 14, "type": "drag_drop", "metadata": {"tokens": ["x"]}}
            ]
        }))
    }

    fn run(section: &Section, store: &mut AnswerStore, id: &str, input: Input) {
        let q = section.question(id).unwrap();
        let updates = encode(q, &Context::new(section, store), &input);
        for update in updates {
            match update {
                Update::Exclusive { scope, key, value } => {
                    store.assign_exclusive(scope.matcher(section), key, &value);
                }
                Update::Clear(key) => {
                    store.clear(&[key]);
                }
                Update::Set(key, value) => {
                    store.set(key, value);
                }
            }
        }
    }

    #[test]
    fn heading_moves_between_questions() {
        let s = section();
        let mut store = AnswerStore::new();
        run(&s, &mut store, "h1", Input::DropHeading("ii".into()));
        run(&s, &mut store, "h2", Input::DropHeading("ii".into()));
        assert!(store.get_question("h1").is_none());
        assert_eq!(store.get_question("h2"), Some(&AnswerValue::single("ii")));
        run(&s, &mut store, "h1", Input::DropHeading("vii".into()));
        assert!(store.get_question("h1").is_none());
    }

    #[test]
    fn heading_slot_lists_unused_headings() {
        let s = section();
        let mut store = AnswerStore::new();
        run(&s, &mut store, "h1", Input::DropHeading("i".into()));
        let ctx = Context::new(&s, &store);
        match render(s.question("h2").unwrap(), &ctx) {
            Rendered::HeadingSlot {
                paragraph,
                assigned,
                available,
            } => {
                assert_eq!(paragraph.as_deref(), Some("B"));
                assert_eq!(assigned, None);
                assert_eq!(available, vec!["ii".to_string(), "iii".to_string()]);
            }
            other => panic!("unexpected view: {other:?}"),
        }
        match render(s.question("h3").unwrap(), &ctx) {
            Rendered::HeadingSlot { paragraph, .. } => assert_eq!(paragraph.as_deref(), Some("Z")),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn token_is_held_by_one_slot() {
        let s = section();
        let mut store = AnswerStore::new();
        run(&s, &mut store, "d1", Input::DropToken("red".into()));
        run(&s, &mut store, "d2", Input::DropToken("red".into()));
        assert!(store.get_question("d1").is_none());
        assert_eq!(store.get_question("d2"), Some(&AnswerValue::single("red")));

        let ctx = Context::new(&s, &store);
        match render(s.question("bank").unwrap(), &ctx) {
            Rendered::TokenBank { tokens, members } => {
                assert_eq!(members, vec!["d1".to_string(), "d2".to_string()]);
                assert_eq!(tokens[0].held_by.as_deref(), Some("d2"));
                assert_eq!(tokens[1].held_by, None);
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn anchor_with_members_takes_no_input() {
        let s = section();
        let mut store = AnswerStore::new();
        run(&s, &mut store, "bank", Input::DropToken("red".into()));
        assert!(store.is_empty());
    }

    #[test]
    fn anchor_without_members_is_its_own_slot() {
        let s = section();
        let mut store = AnswerStore::new();
        run(&s, &mut store, "solo", Input::DropToken("x".into()));
        assert_eq!(store.get_question("solo"), Some(&AnswerValue::single("x")));
    }

    #[test]
    fn member_with_missing_anchor_is_placeholder() {
        let s = section();
        let store = AnswerStore::new();
        let ctx = Context::new(&s, &store);
        assert!(!render(s.question("orphan").unwrap(), &ctx).is_configured());
    }
}
