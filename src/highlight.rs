//! Snippet highlighting.
//!
//! Positions are located by re-scanning the original text with the same
//! separators the tokenizer uses, so a stemmed index term such as `instal`
//! marks the whole word `installing`. All offsets are in characters.

use serde::{Deserialize, Serialize};

use crate::tokenizer::is_separator;

const ELLIPSIS: &str = "...";

/// One piece of highlighted output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "lowercase")]
pub enum Node {
    Text(String),
    Mark(String),
}

impl Node {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Mark(text) => text,
        }
    }

    pub fn is_mark(&self) -> bool {
        matches!(self, Self::Mark(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub start: usize,
    pub length: usize,
}

impl Position {
    pub fn end(self) -> usize {
        self.start + self.length
    }

    pub fn is_found(self) -> bool {
        self.length > 0
    }
}

fn lower(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Locate the first separator-delimited slice of `text` containing `term`.
///
/// Returns a zero-length position when no slice contains the term.
pub fn find_term_position(text: &str, term: &str) -> Position {
    let term: String = term.chars().map(lower).collect();
    if term.is_empty() {
        return Position::default();
    }

    let mut slice = String::new();
    let mut slice_start = 0;
    let mut slice_len = 0;
    for (index, c) in text.chars().chain(std::iter::once(' ')).enumerate() {
        if !is_separator(c) {
            if slice_len == 0 {
                slice_start = index;
            }
            slice.push(lower(c));
            slice_len += 1;
            continue;
        }
        if slice_len > 0 && slice.contains(&term) {
            return Position {
                start: slice_start,
                length: slice_len,
            };
        }
        slice.clear();
        slice_len = 0;
    }
    Position::default()
}

/// Positions of every found term, sorted by start.
pub fn term_positions<S: AsRef<str>>(text: &str, terms: &[S]) -> Vec<Position> {
    let mut positions: Vec<Position> = terms
        .iter()
        .map(|term| find_term_position(text, term.as_ref()))
        .filter(|p| p.is_found())
        .collect();
    positions.sort();
    positions.dedup();
    positions
}

/// Build a snippet of `text` around the first position, marking every
/// position that fits in the window.
///
/// Text no longer than `snippet_length` is shown whole. Otherwise the window
/// spans `snippet_length` characters either side of the first position; the
/// leading edge is moved back to the start of the word it would cut. The
/// trailing edge is not moved, so a snippet may end mid-word.
pub fn build_highlighted_text(
    text: &str,
    positions: &[Position],
    snippet_length: usize,
) -> Vec<Node> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let slice =
        |from: usize, to: usize| chars[from..to].iter().collect::<String>();

    let mut valid: Vec<Position> = positions
        .iter()
        .filter(|p| p.length > 0 && p.end() <= len)
        .copied()
        .collect();
    valid.sort();

    let Some(first) = valid.first().copied() else {
        if len > snippet_length {
            return vec![Node::Text(slice(0, snippet_length) + ELLIPSIS)];
        }
        return vec![Node::Text(text.to_string())];
    };

    let merged = merge_overlapping(valid);

    let (start, end) = if len > snippet_length {
        let mut start = first.start.saturating_sub(snippet_length);
        while start > 0 && !is_separator(chars[start - 1]) {
            start -= 1;
        }
        (start, (first.end() + snippet_length).min(len))
    } else {
        (0, len)
    };

    let mut nodes = Vec::new();
    if first.start > start {
        let prefix = if start > 0 { ELLIPSIS } else { "" };
        nodes.push(Node::Text(format!("{prefix}{}", slice(start, first.start))));
    }

    let mut cursor = first.start;
    for position in merged.iter().filter(|p| p.end() <= end) {
        if position.start > cursor {
            nodes.push(Node::Text(slice(cursor, position.start)));
        }
        nodes.push(Node::Mark(slice(position.start, position.end())));
        cursor = position.end();
    }

    if cursor < end {
        let suffix = if end < len { ELLIPSIS } else { "" };
        nodes.push(Node::Text(format!("{}{suffix}", slice(cursor, end))));
    }
    nodes
}

/// Merge sorted positions so that no two overlap.
fn merge_overlapping(sorted: Vec<Position>) -> Vec<Position> {
    let mut merged: Vec<Position> = Vec::with_capacity(sorted.len());
    for position in sorted {
        match merged.last_mut() {
            Some(last) if position.start < last.end() => {
                last.length = last.end().max(position.end()) - last.start;
            }
            _ => merged.push(position),
        }
    }
    merged
}

/// Highlight every term of `terms` found in `text`.
pub fn highlight<S: AsRef<str>>(
    text: &str,
    terms: &[S],
    snippet_length: usize,
) -> Vec<Node> {
    build_highlighted_text(text, &term_positions(text, terms), snippet_length)
}
