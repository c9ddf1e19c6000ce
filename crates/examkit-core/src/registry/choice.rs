//! Multiple choice, multi-select and true/false/not-given.

use crate::answers::{AnswerKey, AnswerValue};
use crate::model::{Question, QuestionKind, QuestionOption};
use crate::render::{ChoiceView, Rendered};

use super::{Context, Input, QuestionType, Update};

const TRI_STATE: [&str; 3] = ["TRUE", "FALSE", "NOT GIVEN"];

/// Fixed arity of `multi_select` questions.
const CHOOSE_TWO: usize = 2;

pub(crate) struct ChoiceQuestion;

impl ChoiceQuestion {
    fn max_selections(question: &Question) -> usize {
        match question.kind {
            QuestionKind::MultiSelect => CHOOSE_TWO,
            _ if question.metadata.multi_select => {
                question.metadata.select_count.unwrap_or(CHOOSE_TWO).max(1)
            }
            _ => 1,
        }
    }

    fn selected(question: &Question, ctx: &Context<'_>) -> Vec<String> {
        match ctx.answers.get_question(&question.id) {
            Some(AnswerValue::Single(s)) => vec![s.clone()],
            Some(AnswerValue::List(items)) => items.clone(),
            None => Vec::new(),
        }
    }
}

impl QuestionType for ChoiceQuestion {
    fn render(&self, question: &Question, ctx: &Context<'_>) -> Rendered {
        if question.options.is_empty() {
            return Rendered::not_configured("question has no options");
        }
        let selected = Self::selected(question, ctx);
        Rendered::Choices {
            options: option_views(&question.options, &selected),
            max_selections: Self::max_selections(question),
        }
    }

    fn encode(&self, question: &Question, ctx: &Context<'_>, input: &Input) -> Vec<Update> {
        let key = AnswerKey::question(&question.id);
        let max = Self::max_selections(question);

        match input {
            Input::Choose(letter) => {
                if !has_letter(&question.options, letter) {
                    tracing::debug!(question = %question.id, %letter, "ignoring unknown option");
                    return Vec::new();
                }
                if max == 1 {
                    return vec![Update::Set(key, AnswerValue::single(letter.as_str()))];
                }
                let mut selected = Self::selected(question, ctx);
                if selected.iter().any(|s| s == letter) {
                    return Vec::new();
                }
                selected.push(letter.clone());
                // Over the cap the oldest pick gives way.
                while selected.len() > max {
                    selected.remove(0);
                }
                vec![Update::Set(key, AnswerValue::List(selected))]
            }
            Input::Deselect(letter) => {
                let mut selected = Self::selected(question, ctx);
                let before = selected.len();
                selected.retain(|s| s != letter);
                if selected.len() == before {
                    Vec::new()
                } else if selected.is_empty() {
                    vec![Update::Clear(key)]
                } else {
                    vec![Update::Set(key, AnswerValue::List(selected))]
                }
            }
            _ => Vec::new(),
        }
    }
}

pub(crate) struct TrueFalseQuestion;

impl QuestionType for TrueFalseQuestion {
    fn render(&self, question: &Question, ctx: &Context<'_>) -> Rendered {
        let key = AnswerKey::question(&question.id);
        let current = ctx.single(&key).map(str::to_string);
        let options = tri_state_labels(&question.options)
            .into_iter()
            .map(|label| ChoiceView {
                selected: current.as_deref() == Some(label.as_str()),
                text: label.clone(),
                letter: label,
            })
            .collect();
        Rendered::TriState { options }
    }

    fn encode(&self, question: &Question, _ctx: &Context<'_>, input: &Input) -> Vec<Update> {
        let key = AnswerKey::question(&question.id);
        match input {
            Input::Choose(value) => match canonical_tri_state(&question.options, value) {
                Some(label) => vec![Update::Set(key, AnswerValue::Single(label))],
                None => Vec::new(),
            },
            Input::Deselect(_) => vec![Update::Clear(key)],
            _ => Vec::new(),
        }
    }
}

/// The three labels of a tri-state question: the question's own option
/// letters when it has exactly three (e.g. YES/NO/NOT GIVEN), otherwise
/// TRUE/FALSE/NOT GIVEN.
pub fn tri_state_labels(options: &[QuestionOption]) -> Vec<String> {
    if options.len() == 3 {
        options.iter().map(|o| o.letter.clone()).collect()
    } else {
        TRI_STATE.iter().map(|s| s.to_string()).collect()
    }
}

/// Match user input against the labels, ignoring case and `_`/space.
pub(crate) fn canonical_tri_state(options: &[QuestionOption], value: &str) -> Option<String> {
    let wanted = normalize(value);
    let labels = tri_state_labels(options);
    labels
        .iter()
        .find(|label| normalize(label) == wanted)
        .cloned()
        .or_else(|| match wanted.as_str() {
            "T" => labels.first().cloned(),
            "F" => labels.get(1).cloned(),
            "NG" => labels.get(2).cloned(),
            _ => None,
        })
}

fn normalize(value: &str) -> String {
    value
        .trim()
        .to_uppercase()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn has_letter(options: &[QuestionOption], letter: &str) -> bool {
    options.iter().any(|o| o.letter == letter)
}

pub(crate) fn option_views(options: &[QuestionOption], selected: &[String]) -> Vec<ChoiceView> {
    options
        .iter()
        .map(|o| ChoiceView {
            letter: o.letter.clone(),
            text: o.text.clone(),
            selected: selected.iter().any(|s| *s == o.letter),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::AnswerStore;
    use crate::model::Section;
    use crate::registry::{encode, fixtures, render};

    fn section() -> Section {
        fixtures::section(serde_json::json!({
            "id": "s1",
            "type": "reading",
            "questions": [
                {"id": "single", "number": 1, "type": "multiple_choice",
                 "options": [{"letter": "A", "text": "a"}, {"letter": "B", "text": "b"}, {"letter": "C", "text": "c"}]},
                {"id": "pick2", "number": 2, "type": "multi_select",
                 "options": [{"letter": "A", "text": "a"}, {"letter": "B", "text": "b"}, {"letter": "C", "text": "c"}]},
                {"id": "pick3", "number": 3, "type": "multiple_choice",
                 "metadata": {"multiSelect": true, "selectCount": 3},
                 "options": [{"letter": "A"}, {"letter": "B"}, {"letter": "C"}, {"letter": "D"}]},
                {"id": "tf", "number": 4, "type": "true_false"},
                {"id": "yn", "number": 5, "type": "true_false",
                 "options": [{"letter": "YES"}, {"letter": "NO"}, {"letter": "NOT GIVEN"}]},
                {"id": "empty", "number": 6, "type": "multiple_choice"}
            ]
        }))
    }

    fn apply(store: &mut AnswerStore, updates: Vec<Update>) {
        for update in updates {
            match update {
                Update::Set(k, v) => {
                    store.set(k, v);
                }
                Update::Clear(k) => {
                    store.clear(&[k]);
                }
                Update::Exclusive { .. } => unreachable!("choices are not exclusive"),
            }
        }
    }

    fn run(section: &Section, store: &mut AnswerStore, id: &str, input: Input) {
        let q = section.question(id).unwrap();
        let updates = encode(q, &crate::registry::Context::new(section, store), &input);
        apply(store, updates);
    }

    #[test]
    fn single_choice_replaces_and_is_idempotent() {
        let s = section();
        let mut store = AnswerStore::new();
        run(&s, &mut store, "single", Input::Choose("A".into()));
        run(&s, &mut store, "single", Input::Choose("B".into()));
        run(&s, &mut store, "single", Input::Choose("B".into()));
        assert_eq!(store.get_question("single"), Some(&AnswerValue::single("B")));
    }

    #[test]
    fn unknown_letter_is_ignored() {
        let s = section();
        let mut store = AnswerStore::new();
        run(&s, &mut store, "single", Input::Choose("Z".into()));
        assert!(store.is_empty());
    }

    #[test]
    fn choose_two_drops_oldest() {
        let s = section();
        let mut store = AnswerStore::new();
        run(&s, &mut store, "pick2", Input::Choose("A".into()));
        run(&s, &mut store, "pick2", Input::Choose("B".into()));
        run(&s, &mut store, "pick2", Input::Choose("B".into()));
        run(&s, &mut store, "pick2", Input::Choose("C".into()));
        assert_eq!(
            store.get_question("pick2"),
            Some(&AnswerValue::List(vec!["B".into(), "C".into()]))
        );
    }

    #[test]
    fn configured_select_count_and_deselect() {
        let s = section();
        let mut store = AnswerStore::new();
        for letter in ["A", "B", "C", "D"] {
            run(&s, &mut store, "pick3", Input::Choose(letter.into()));
        }
        assert_eq!(
            store.get_question("pick3").and_then(|v| v.as_list()).map(|l| l.len()),
            Some(3)
        );
        for letter in ["B", "C", "D"] {
            run(&s, &mut store, "pick3", Input::Deselect(letter.into()));
        }
        assert!(store.get_question("pick3").is_none());
    }

    #[test]
    fn tri_state_canonicalizes_input() {
        let s = section();
        let mut store = AnswerStore::new();
        run(&s, &mut store, "tf", Input::Choose("not_given".into()));
        assert_eq!(store.get_question("tf"), Some(&AnswerValue::single("NOT GIVEN")));
        run(&s, &mut store, "yn", Input::Choose("no".into()));
        assert_eq!(store.get_question("yn"), Some(&AnswerValue::single("NO")));
        run(&s, &mut store, "yn", Input::Choose("maybe".into()));
        assert_eq!(store.get_question("yn"), Some(&AnswerValue::single("NO")));
    }

    #[test]
    fn renders_selection_and_placeholder() {
        let s = section();
        let mut store = AnswerStore::new();
        run(&s, &mut store, "pick2", Input::Choose("C".into()));
        let ctx = crate::registry::Context::new(&s, &store);
        match render(s.question("pick2").unwrap(), &ctx) {
            Rendered::Choices {
                options,
                max_selections,
            } => {
                assert_eq!(max_selections, 2);
                assert!(options[2].selected);
                assert!(!options[0].selected);
            }
            other => panic!("unexpected view: {other:?}"),
        }
        assert!(!render(s.question("empty").unwrap(), &ctx).is_configured());
    }
}
