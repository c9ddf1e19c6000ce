//! Passage segmenter.
//!
//! Splits raw reading-passage text into addressable paragraphs for matching
//! questions. Explicit `[[p1]]` markers are authoritative; otherwise lettered
//! paragraphs (`A` on its own line, or a line opening with `A `) are inferred,
//! and as a last resort the text is split on blank lines.
//!
//! The segmenter is pure and total: malformed input degrades to the blank-line
//! split or a single whole-text paragraph.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[\s*[pP]?(\d+)\s*\]\]").expect("marker pattern is valid")
});

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t\r]*\n").expect("blank-line pattern is valid"));

/// How a paragraph is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Anchor {
    /// From an explicit `[[pN]]` marker.
    Marker(u32),
    /// An inferred paragraph letter.
    Letter(char),
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Marker(n) => write!(f, "{n}"),
            Anchor::Letter(c) => write!(f, "{c}"),
        }
    }
}

/// One paragraph of a passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    pub anchor: Option<Anchor>,
    pub text: String,
}

impl Paragraph {
    fn plain(text: &str) -> Self {
        Self {
            anchor: None,
            text: text.trim().to_string(),
        }
    }
}

/// Segment a passage into paragraphs.
pub fn segment(text: &str) -> Vec<Paragraph> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    if MARKER.is_match(text) {
        return split_on_markers(text);
    }

    let mut paragraphs = scan_lettered(text);
    assign_letters(&mut paragraphs);

    if paragraphs.len() >= 2 {
        return paragraphs;
    }
    split_on_blank_lines(text)
}

fn split_on_markers(text: &str) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut pending: Option<u32> = None;
    let mut cursor = 0;

    for caps in MARKER.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let chunk = &text[cursor..whole.start()];
        match pending {
            Some(n) => paragraphs.push(Paragraph {
                anchor: Some(Anchor::Marker(n)),
                text: chunk.trim().to_string(),
            }),
            // Preamble before the first marker is kept unanchored.
            None if !chunk.trim().is_empty() => paragraphs.push(Paragraph::plain(chunk)),
            None => {}
        }
        pending = caps.get(1).and_then(|m| m.as_str().parse().ok());
        cursor = whole.end();
    }

    if let Some(n) = pending {
        paragraphs.push(Paragraph {
            anchor: Some(Anchor::Marker(n)),
            text: text[cursor..].trim().to_string(),
        });
    }
    paragraphs
}

fn scan_lettered(text: &str) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut letter: Option<char> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            flush(&mut paragraphs, &mut letter, &mut buffer);
            continue;
        }

        if let Some(c) = lone_letter(line) {
            flush(&mut paragraphs, &mut letter, &mut buffer);
            letter = Some(c);
            continue;
        }

        if buffer.is_empty() {
            if let Some((c, rest)) = leading_letter(line) {
                // A pending lone-letter line already named this paragraph.
                if letter.is_none() {
                    letter = Some(c);
                    buffer.push(rest);
                    continue;
                }
            }
        }
        buffer.push(line);
    }
    flush(&mut paragraphs, &mut letter, &mut buffer);
    paragraphs
}

fn flush(paragraphs: &mut Vec<Paragraph>, letter: &mut Option<char>, buffer: &mut Vec<&str>) {
    if !buffer.is_empty() {
        paragraphs.push(Paragraph {
            anchor: letter.take().map(Anchor::Letter),
            text: buffer.join(" "),
        });
        buffer.clear();
    }
}

fn lone_letter(line: &str) -> Option<char> {
    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => Some(c),
        _ => None,
    }
}

fn leading_letter(line: &str) -> Option<(char, &str)> {
    let mut chars = line.chars();
    let c = chars.next().filter(char::is_ascii_uppercase)?;
    let rest = chars.as_str();
    if rest.starts_with(char::is_whitespace) && !rest.trim().is_empty() {
        Some((c, rest.trim_start()))
    } else {
        None
    }
}

/// Make letters unique and fill gaps once lettering has started.
fn assign_letters(paragraphs: &mut [Paragraph]) {
    let mut used = BTreeSet::new();
    let mut started = false;

    for paragraph in paragraphs.iter_mut() {
        let wanted = match paragraph.anchor {
            Some(Anchor::Letter(c)) => Some(c),
            _ => None,
        };
        let letter = match wanted {
            Some(c) if !used.contains(&c) => Some(c),
            Some(_) => next_free(&used),
            None if started => next_free(&used),
            None => None,
        };
        if let Some(c) = letter {
            started = true;
            used.insert(c);
        }
        paragraph.anchor = letter.map(Anchor::Letter);
    }
}

fn next_free(used: &BTreeSet<char>) -> Option<char> {
    ('A'..='Z').find(|c| !used.contains(c))
}

fn split_on_blank_lines(text: &str) -> Vec<Paragraph> {
    let paragraphs: Vec<Paragraph> = BLANK_LINES
        .split(text)
        .filter(|chunk| !chunk.trim().is_empty())
        .map(Paragraph::plain)
        .collect();
    if paragraphs.is_empty() {
        vec![Paragraph::plain(text)]
    } else {
        paragraphs
    }
}
