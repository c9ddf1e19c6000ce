//! Fill-in-the-blank, free text (essay, writing, speaking) and short answer.

use crate::answers::{AnswerKey, AnswerValue};
use crate::model::Question;
use crate::render::{count_words, NumberLabel, Rendered, Segment, WordCount};
use crate::tokens::{tokenize, Token};

use super::{Context, Input, QuestionType, Update};

pub(crate) struct FillBlankQuestion;

impl FillBlankQuestion {
    fn blank_count(question: &Question) -> usize {
        crate::tokens::blank_count(&question.text)
    }

    fn label(question: &Question, blanks: usize) -> NumberLabel {
        if blanks < 2 || question.metadata.shared_number {
            return NumberLabel::Single(question.number);
        }
        NumberLabel::Each(
            (0..blanks)
                .map(|i| blank_number(question, i))
                .collect(),
        )
    }

    fn render_template(question: &Question, template: &str, ctx: &Context<'_>) -> Rendered {
        let mut references = Vec::new();
        let segments = tokenize(template)
            .into_iter()
            .map(|token| match token {
                Token::Text(text) => Segment::Text { text },
                Token::Blank {
                    reference: Some(n), ..
                } => {
                    references.push(n);
                    let member = ctx
                        .section
                        .questions
                        .iter()
                        .find(|q| q.number == n && q.id != question.id);
                    match member {
                        Some(member) => Segment::Input {
                            target: member.id.clone(),
                            blank: None,
                            number: Some(n),
                            value: ctx
                                .single(&AnswerKey::question(&member.id))
                                .unwrap_or_default()
                                .to_string(),
                        },
                        _ => Segment::Missing { reference: n },
                    }
                }
                Token::Blank {
                    reference: None, ..
                } => Segment::Input {
                    target: question.id.clone(),
                    blank: None,
                    number: Some(question.number),
                    value: ctx
                        .single(&AnswerKey::question(&question.id))
                        .unwrap_or_default()
                        .to_string(),
                },
            })
            .collect();
        Rendered::Blanks {
            label: NumberLabel::Each(references),
            segments,
        }
    }

    fn current_list(question: &Question, ctx: &Context<'_>, blanks: usize) -> Vec<String> {
        let mut list = match ctx.answers.get_question(&question.id) {
            Some(AnswerValue::List(items)) => items.clone(),
            Some(AnswerValue::Single(s)) => vec![s.clone()],
            None => Vec::new(),
        };
        list.resize(blanks, String::new());
        list
    }
}

impl QuestionType for FillBlankQuestion {
    fn render(&self, question: &Question, ctx: &Context<'_>) -> Rendered {
        if let Some(template) = &question.metadata.template {
            return Self::render_template(question, template, ctx);
        }

        let blanks = Self::blank_count(question);
        let key = AnswerKey::question(&question.id);
        let values = if blanks >= 2 {
            Self::current_list(question, ctx, blanks)
        } else {
            vec![ctx.single(&key).unwrap_or_default().to_string()]
        };

        let mut segments: Vec<Segment> = tokenize(&question.text)
            .into_iter()
            .map(|token| match token {
                Token::Text(text) => Segment::Text { text },
                Token::Blank { index, .. } => Segment::Input {
                    target: question.id.clone(),
                    blank: (blanks >= 2).then_some(index),
                    number: Some(if question.metadata.shared_number {
                        question.number
                    } else {
                        blank_number(question, index)
                    }),
                    value: values.get(index).cloned().unwrap_or_default(),
                },
            })
            .collect();

        // No marker in the text: one input after it.
        if blanks == 0 {
            segments.push(Segment::Input {
                target: question.id.clone(),
                blank: None,
                number: Some(question.number),
                value: values.first().cloned().unwrap_or_default(),
            });
        }

        Rendered::Blanks {
            label: Self::label(question, blanks),
            segments,
        }
    }

    fn encode(&self, question: &Question, ctx: &Context<'_>, input: &Input) -> Vec<Update> {
        let key = AnswerKey::question(&question.id);
        let blanks = Self::blank_count(question);
        let max_words = question.metadata.max_words;

        match input {
            Input::Text(text) | Input::Blank { index: 0, text } if blanks < 2 => {
                if exceeds(text, max_words) {
                    return Vec::new();
                }
                vec![Update::text(key, text)]
            }
            Input::Blank { index, text } if blanks >= 2 && *index < blanks => {
                if exceeds(text, max_words) {
                    return Vec::new();
                }
                let mut list = Self::current_list(question, ctx, blanks);
                list[*index] = text.clone();
                if list.iter().all(String::is_empty) {
                    vec![Update::Clear(key)]
                } else {
                    vec![Update::Set(key, AnswerValue::List(list))]
                }
            }
            _ => Vec::new(),
        }
    }
}

/// Display number of blank `index`.
fn blank_number(question: &Question, index: usize) -> u32 {
    question
        .metadata
        .blank_numbers
        .get(index)
        .copied()
        .unwrap_or(question.number + index as u32)
}

pub(super) fn exceeds(text: &str, max_words: Option<usize>) -> bool {
    max_words.is_some_and(|max| count_words(text) > max)
}

pub(crate) struct FreeTextQuestion;

impl QuestionType for FreeTextQuestion {
    fn render(&self, question: &Question, ctx: &Context<'_>) -> Rendered {
        let text = ctx
            .single(&AnswerKey::question(&question.id))
            .unwrap_or_default()
            .to_string();
        let words = WordCount::measure(
            &text,
            question.metadata.min_words,
            question.metadata.max_words,
        );
        Rendered::FreeText { text, words }
    }

    fn encode(&self, question: &Question, _ctx: &Context<'_>, input: &Input) -> Vec<Update> {
        match input {
            Input::Text(text) => vec![Update::text(AnswerKey::question(&question.id), text)],
            _ => Vec::new(),
        }
    }
}

pub(crate) struct ShortAnswerQuestion;

impl QuestionType for ShortAnswerQuestion {
    fn render(&self, question: &Question, ctx: &Context<'_>) -> Rendered {
        let text = ctx
            .single(&AnswerKey::question(&question.id))
            .unwrap_or_default()
            .to_string();
        let words = WordCount::measure(&text, None, question.metadata.max_words);
        Rendered::FreeText { text, words }
    }

    fn encode(&self, question: &Question, _ctx: &Context<'_>, input: &Input) -> Vec<Update> {
        match input {
            Input::Text(text) => {
                // Keystrokes past the cap are rejected, not truncated.
                if exceeds(text, question.metadata.max_words) {
                    tracing::debug!(question = %question.id, "short answer over word cap");
                    return Vec::new();
                }
                vec![Update::text(AnswerKey::question(&question.id), text)]
            }
            _ => Vec::new(),
        }
    }
}
