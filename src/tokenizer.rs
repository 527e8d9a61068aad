//! Tokenization shared by the index builder and the highlighter.
//!
//! Text is split on [`is_separator`] characters (whitespace and hyphens),
//! then each slice is trimmed of leading and trailing non-word characters.
//! The highlighter splits on the same separators so that a term recovered
//! from the index can always be located in the original text.
//!
//! When CJK segmentation is enabled, runs of Han and kana characters inside
//! a slice are emitted one character per token, since those scripts carry
//! no whitespace between words.

use tantivy::tokenizer::{Token, TokenStream, Tokenizer};

/// Returns true for characters that separate tokens.
pub fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '-'
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Han ideographs, hiragana and katakana.
pub fn is_cjk(c: char) -> bool {
    matches!(
        c,
        '\u{3040}'..='\u{309F}'
            | '\u{30A0}'..='\u{30FF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
    )
}

/// Tokenizer registered as the first stage of every analyzer.
#[derive(Debug, Clone, Default)]
pub struct SiteTokenizer {
    segment_cjk: bool,
}

impl SiteTokenizer {
    pub fn new(segment_cjk: bool) -> Self {
        Self { segment_cjk }
    }

    /// Split `text` into tokens with byte offsets into `text`.
    pub fn tokens(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut slice_start = None;

        for (idx, c) in text.char_indices() {
            if is_separator(c) {
                if let Some(start) = slice_start.take() {
                    self.push_slice(text, start, idx, &mut tokens);
                }
            } else if slice_start.is_none() {
                slice_start = Some(idx);
            }
        }
        if let Some(start) = slice_start {
            self.push_slice(text, start, text.len(), &mut tokens);
        }

        tokens
    }

    fn push_slice(
        &self,
        text: &str,
        start: usize,
        end: usize,
        tokens: &mut Vec<Token>,
    ) {
        let slice = &text[start..end];
        let Some(first) = slice.find(is_word_char) else {
            return;
        };
        let last = slice
            .char_indices()
            .rev()
            .find(|(_, c)| is_word_char(*c))
            .map_or(first, |(idx, c)| idx + c.len_utf8());
        let trimmed_start = start + first;
        let trimmed_end = start + last;

        if self.segment_cjk {
            self.push_segmented(text, trimmed_start, trimmed_end, tokens);
        } else {
            push_token(text, trimmed_start, trimmed_end, tokens);
        }
    }

    fn push_segmented(
        &self,
        text: &str,
        start: usize,
        end: usize,
        tokens: &mut Vec<Token>,
    ) {
        let mut run_start = None;
        for (offset, c) in text[start..end].char_indices() {
            let idx = start + offset;
            if is_cjk(c) {
                if let Some(run) = run_start.take() {
                    push_token(text, run, idx, tokens);
                }
                push_token(text, idx, idx + c.len_utf8(), tokens);
            } else if run_start.is_none() {
                run_start = Some(idx);
            }
        }
        if let Some(run) = run_start {
            push_token(text, run, end, tokens);
        }
    }
}

fn push_token(text: &str, from: usize, to: usize, tokens: &mut Vec<Token>) {
    if from >= to {
        return;
    }
    tokens.push(Token {
        offset_from: from,
        offset_to: to,
        position: tokens.len(),
        text: text[from..to].to_string(),
        position_length: 1,
    });
}

/// Pre-computed token stream over the output of [`SiteTokenizer::tokens`].
pub struct SiteTokenStream {
    tokens: Vec<Token>,
    current: Option<usize>,
}

impl TokenStream for SiteTokenStream {
    fn advance(&mut self) -> bool {
        let next = self.current.map_or(0, |idx| idx + 1);
        if next < self.tokens.len() {
            self.current = Some(next);
            true
        } else {
            false
        }
    }

    fn token(&self) -> &Token {
        &self.tokens[self.current.unwrap_or_default()]
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.tokens[self.current.unwrap_or_default()]
    }
}

impl Tokenizer for SiteTokenizer {
    type TokenStream<'a> = SiteTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> SiteTokenStream {
        SiteTokenStream {
            tokens: self.tokens(text),
            current: None,
        }
    }
}
