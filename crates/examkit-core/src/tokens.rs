//! Inline placeholder tokenizer.
//!
//! Question text marks blanks with `{{blank}}`, `[blank]` or a run of three or
//! more underscores. Composite templates use `{{14}}` to reference question
//! number 14. Renderers consume the token list instead of re-scanning text.

use std::sync::LazyLock;

use regex::Regex;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\{\{\s*(blank|\d+)\s*\}\}|\[blank\]|_{3,}")
        .expect("placeholder pattern is valid")
});

/// One piece of tokenized question text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    Blank {
        /// Ordinal among the blanks of this text.
        index: usize,
        /// Question number referenced by a composite template token.
        reference: Option<u32>,
    },
}

/// Split text into literal runs and blanks. Never fails.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut cursor = 0;
    let mut index = 0;

    for caps in PLACEHOLDER.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > cursor {
            tokens.push(Token::Text(text[cursor..whole.start()].to_string()));
        }
        let reference = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
        tokens.push(Token::Blank { index, reference });
        index += 1;
        cursor = whole.end();
    }

    if cursor < text.len() {
        tokens.push(Token::Text(text[cursor..].to_string()));
    }
    tokens
}

/// Number of blanks in `text`.
pub fn blank_count(text: &str) -> usize {
    PLACEHOLDER.find_iter(text).count()
}

/// Question numbers referenced by a composite template, in order.
pub fn template_references(template: &str) -> Vec<u32> {
    tokenize(template)
        .into_iter()
        .filter_map(|t| match t {
            Token::Blank { reference, .. } => reference,
            Token::Text(_) => None,
        })
        .collect()
}
