//! Query grammar and tier rewriting.
//!
//! A query is a list of whitespace-separated clauses:
//!
//! - `+term` must match, `-term` must not match, a bare term may match;
//! - `field:term` restricts the clause to one index field;
//! - `*` anywhere in a term is a wildcard;
//! - `term^2` boosts the clause, `term~1` allows one edit;
//! - `"two words"` yields one required clause per word.
//!
//! The prefix and substring tiers are derived from the parsed clauses of the
//! exact tier, never from the raw query string.

use crate::index::Field;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryParseError {
    #[error("expected a term after `{marker}` at position {position}")]
    MissingTerm { marker: String, position: usize },

    #[error(
        "unrecognised field `{field}` at position {position}, possible fields: title, name, text, component"
    )]
    UnknownField { field: String, position: usize },

    #[error("invalid boost `{value}` at position {position}")]
    InvalidBoost { value: String, position: usize },

    #[error("invalid edit distance `{value}` at position {position}")]
    InvalidEditDistance { value: String, position: usize },

    #[error("unterminated phrase starting at position {position}")]
    UnterminatedPhrase { position: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Optional,
    Required,
    Prohibited,
}

/// One term constraint of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Lowercased term; may contain `*` wildcards.
    pub term: String,
    /// Restricts matching to these fields; `None` means every field.
    pub fields: Option<Vec<Field>>,
    pub presence: Presence,
    /// Whether the term goes through the stemming pipeline before lookup.
    pub use_pipeline: bool,
    pub boost: f32,
    pub edit_distance: u8,
}

impl Clause {
    pub fn new(term: &str) -> Self {
        let term = term.to_lowercase();
        Self {
            use_pipeline: !term.contains('*'),
            term,
            fields: None,
            presence: Presence::Optional,
            boost: 1.0,
            edit_distance: 0,
        }
    }

    pub fn fields(&self) -> &[Field] {
        self.fields.as_deref().unwrap_or(&Field::ALL)
    }

    pub fn has_wildcard(&self) -> bool {
        self.term.contains('*')
    }

    /// Literal wildcard form of this clause, used by the fallback tiers.
    /// Prohibited clauses are left untouched.
    fn wildcarded(&self, leading: bool) -> Self {
        if self.presence == Presence::Prohibited {
            return self.clone();
        }
        let mut term = self.term.clone();
        if !term.ends_with('*') {
            term.push('*');
        }
        if leading && !term.starts_with('*') {
            term.insert(0, '*');
        }
        Self {
            term,
            use_pipeline: false,
            ..self.clone()
        }
    }
}

/// Query resolution strategy, in evaluation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Exact,
    Prefix,
    Substring,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Exact, Tier::Prefix, Tier::Substring];
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Exact => "exact",
            Self::Prefix => "prefix",
            Self::Substring => "substring",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub clauses: Vec<Clause>,
}

impl Query {
    pub fn parse(input: &str) -> Result<Self, QueryParseError> {
        Parser::new(input).parse()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The query executed for `tier`, derived from these (exact) clauses.
    pub fn for_tier(&self, tier: Tier) -> Self {
        let clauses = match tier {
            Tier::Exact => self.clauses.clone(),
            Tier::Prefix => {
                self.clauses.iter().map(|c| c.wildcarded(false)).collect()
            }
            Tier::Substring => {
                self.clauses.iter().map(|c| c.wildcarded(true)).collect()
            }
        };
        Self { clauses }
    }
}

struct Parser<'a> {
    chars: Vec<(usize, char)>,
    pos: usize,
    input: &'a str,
    clauses: Vec<Clause>,
}

#[derive(Default)]
struct Modifiers {
    boost: Option<f32>,
    edit_distance: Option<u8>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().collect(),
            pos: 0,
            input,
            clauses: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map_or(self.input.len(), |(idx, _)| *idx)
    }

    fn parse(mut self) -> Result<Query, QueryParseError> {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.pos += 1;
            }
            if self.peek().is_none() {
                break;
            }
            self.parse_clause_group()?;
        }
        Ok(Query {
            clauses: self.clauses,
        })
    }

    /// Parse one whitespace-delimited unit, which may expand to several
    /// clauses (hyphenated words, phrases).
    fn parse_clause_group(&mut self) -> Result<(), QueryParseError> {
        let start = self.offset();
        let (presence, mut marker) = match self.peek() {
            Some('+') => (Presence::Required, "+".to_string()),
            Some('-') => (Presence::Prohibited, "-".to_string()),
            _ => (Presence::Optional, String::new()),
        };
        if presence != Presence::Optional {
            self.pos += 1;
        }

        let fields = self.parse_field_qualifier(&mut marker)?;

        let (words, presence) = if self.peek() == Some('"') {
            let words = self.parse_phrase(start)?;
            let presence = match presence {
                Presence::Prohibited => Presence::Prohibited,
                _ => Presence::Required,
            };
            (words, presence)
        } else {
            (self.parse_term_words(), presence)
        };
        let modifiers = self.parse_modifiers()?;

        if words.is_empty() {
            return Err(QueryParseError::MissingTerm {
                marker: if marker.is_empty() {
                    "\"".to_string()
                } else {
                    marker
                },
                position: start,
            });
        }

        for word in words {
            let mut clause = Clause::new(&word);
            clause.fields = fields.clone();
            clause.presence = presence;
            if let Some(boost) = modifiers.boost {
                clause.boost = boost;
            }
            if let Some(distance) = modifiers.edit_distance {
                clause.edit_distance = distance;
            }
            self.clauses.push(clause);
        }
        Ok(())
    }

    fn parse_field_qualifier(
        &mut self,
        marker: &mut String,
    ) -> Result<Option<Vec<Field>>, QueryParseError> {
        let rest = &self.chars[self.pos..];
        let colon = rest
            .iter()
            .take_while(|(_, c)| !c.is_whitespace() && *c != '"')
            .position(|(_, c)| *c == ':');
        let Some(colon) = colon else {
            return Ok(None);
        };

        let name: String = rest[..colon].iter().map(|(_, c)| *c).collect();
        let position = self.offset();
        let field = Field::from_name(&name.to_lowercase()).ok_or(
            QueryParseError::UnknownField {
                field: name.clone(),
                position,
            },
        )?;
        self.pos += colon + 1;
        marker.push_str(&name);
        marker.push(':');
        Ok(Some(vec![field]))
    }

    fn parse_phrase(
        &mut self,
        start: usize,
    ) -> Result<Vec<String>, QueryParseError> {
        self.pos += 1;
        let mut phrase = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(QueryParseError::UnterminatedPhrase {
                        position: start,
                    });
                }
                Some('"') => {
                    self.pos += 1;
                    break;
                }
                Some(c) => {
                    phrase.push(c);
                    self.pos += 1;
                }
            }
        }
        Ok(split_words(&phrase))
    }

    /// Read a bare term up to whitespace or a modifier.
    fn parse_term_words(&mut self) -> Vec<String> {
        let mut term = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '^' || c == '~' {
                break;
            }
            term.push(c);
            self.pos += 1;
        }
        split_words(&term)
    }

    fn parse_modifiers(&mut self) -> Result<Modifiers, QueryParseError> {
        let mut modifiers = Modifiers::default();
        while let Some(kind @ ('^' | '~')) = self.peek() {
            let position = self.offset();
            self.pos += 1;
            let mut value = String::new();
            while let Some(c) = self.peek() {
                if c.is_whitespace() || c == '^' || c == '~' {
                    break;
                }
                value.push(c);
                self.pos += 1;
            }
            if kind == '^' {
                let boost = value
                    .parse::<f32>()
                    .ok()
                    .filter(|b| b.is_finite() && *b > 0.0)
                    .ok_or(QueryParseError::InvalidBoost {
                        value: value.clone(),
                        position,
                    })?;
                modifiers.boost = Some(boost);
            } else {
                let distance = value.parse::<u8>().map_err(|_| {
                    QueryParseError::InvalidEditDistance {
                        value: value.clone(),
                        position,
                    }
                })?;
                modifiers.edit_distance = Some(distance);
            }
        }
        Ok(modifiers)
    }
}

fn split_words(text: &str) -> Vec<String> {
    text.split(crate::tokenizer::is_separator)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}
