//! Serializable inverted index.
//!
//! The index stores, per analyzed term, the records and fields it occurs in.
//! Records are identified by opaque ref strings supplied at build time.
//! Field lengths are kept per record so that queries can be scored with
//! BM25 without the original text.
//!
//! Only the language codes are serialized; the text analyzer is rebuilt from
//! the language registry when a [`Searcher`] is created.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fmt,
    ops::Bound,
};

use serde::{Deserialize, Serialize};
use tantivy::tokenizer::TextAnalyzer;

use crate::{
    error::{Error, Result},
    language::{LanguageSet, analyze},
    query::{Clause, Presence, Query},
};

const BM25_K1: f32 = 1.2;
const BM25_B: f32 = 0.75;

/// Weight of the title field relative to every other field.
pub const TITLE_BOOST: f32 = 10.0;

/// Fields every record may carry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Name,
    Text,
    Component,
}

impl Field {
    pub const ALL: [Field; 4] =
        [Field::Title, Field::Name, Field::Text, Field::Component];

    pub fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Name => "name",
            Self::Text => "text",
            Self::Component => "component",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn boost(self) -> f32 {
        match self {
            Self::Title => TITLE_BOOST,
            _ => 1.0,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Posting {
    record: u32,
    field: Field,
    tf: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct TermEntry {
    /// Number of records containing the term in any field.
    df: u32,
    postings: Vec<Posting>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvertedIndex {
    languages: LanguageSet,
    refs: Vec<String>,
    field_lengths: Vec<[u32; 4]>,
    average_field_lengths: [f32; 4],
    terms: BTreeMap<String, TermEntry>,
}

impl InvertedIndex {
    pub fn languages(&self) -> &LanguageSet {
        &self.languages
    }

    /// Refs of every record, in insertion order.
    pub fn refs(&self) -> &[String] {
        &self.refs
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }
}

/// Accumulates records into an [`InvertedIndex`].
pub struct IndexBuilder {
    languages: LanguageSet,
    analyzer: TextAnalyzer,
    refs: Vec<String>,
    seen_refs: HashSet<String>,
    field_lengths: Vec<[u32; 4]>,
    terms: BTreeMap<String, TermEntry>,
}

impl IndexBuilder {
    pub fn new(languages: LanguageSet) -> Self {
        Self {
            analyzer: languages.analyzer(),
            languages,
            refs: Vec::new(),
            seen_refs: HashSet::new(),
            field_lengths: Vec::new(),
            terms: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Add one record. Refs must be unique within a build.
    pub fn add(&mut self, reference: &str, fields: &[(Field, &str)]) -> Result<()> {
        if !self.seen_refs.insert(reference.to_string()) {
            return Err(Error::DuplicateRef(reference.to_string()));
        }
        let record = u32::try_from(self.refs.len()).map_err(|_| {
            Error::Config("too many records for one index".into())
        })?;

        let mut lengths = [0u32; 4];
        let mut frequencies: BTreeMap<(String, Field), u32> = BTreeMap::new();
        for (field, text) in fields {
            let tokens = analyze(&self.analyzer, text);
            lengths[field.slot()] += tokens.len() as u32;
            for token in tokens {
                *frequencies.entry((token, *field)).or_default() += 1;
            }
        }

        let mut counted: HashSet<String> = HashSet::new();
        for ((term, field), tf) in frequencies {
            let entry = self.terms.entry(term.clone()).or_default();
            if counted.insert(term) {
                entry.df += 1;
            }
            entry.postings.push(Posting { record, field, tf });
        }

        self.refs.push(reference.to_string());
        self.field_lengths.push(lengths);
        Ok(())
    }

    pub fn build(self) -> InvertedIndex {
        let mut average_field_lengths = [0f32; 4];
        if !self.field_lengths.is_empty() {
            let count = self.field_lengths.len() as f32;
            for lengths in &self.field_lengths {
                for (slot, len) in lengths.iter().enumerate() {
                    average_field_lengths[slot] += *len as f32;
                }
            }
            for avg in &mut average_field_lengths {
                *avg /= count;
            }
        }

        InvertedIndex {
            languages: self.languages,
            refs: self.refs,
            field_lengths: self.field_lengths,
            average_field_lengths,
            terms: self.terms,
        }
    }
}

impl fmt::Debug for IndexBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexBuilder")
            .field("records", &self.refs.len())
            .finish_non_exhaustive()
    }
}

/// Which index terms matched a record, and in which fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchData {
    terms: BTreeMap<String, BTreeSet<Field>>,
}

impl MatchData {
    pub fn insert(&mut self, term: &str, field: Field) {
        self.terms.entry(term.to_string()).or_default().insert(field);
    }

    /// Terms that matched in `field`, in lexical order.
    pub fn terms_in(&self, field: Field) -> Vec<&str> {
        self.terms
            .iter()
            .filter(|(_, fields)| fields.contains(&field))
            .map(|(term, _)| term.as_str())
            .collect()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// A record matching a query.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub reference: String,
    pub score: f32,
    pub match_data: MatchData,
}

/// Executes queries against a loaded index.
pub struct Searcher {
    index: InvertedIndex,
    analyzer: TextAnalyzer,
}

impl Searcher {
    pub fn new(index: InvertedIndex) -> Self {
        let analyzer = index.languages.analyzer();
        Self { index, analyzer }
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    /// Run `query` and return matching records, best first.
    ///
    /// Required clauses must match in at least one of their fields,
    /// prohibited clauses exclude records, optional clauses only add score.
    /// A query made only of prohibited clauses matches every other record.
    pub fn query(&self, query: &Query) -> Vec<IndexHit> {
        let mut scores: HashMap<u32, f32> = HashMap::new();
        let mut matches: HashMap<u32, MatchData> = HashMap::new();
        let mut required: Option<HashSet<u32>> = None;
        let mut prohibited: HashSet<u32> = HashSet::new();
        let mut has_positive = false;

        for clause in &query.clauses {
            let fields = clause.fields();
            let mut clause_records = HashSet::new();

            for (term, entry) in self.expand(clause) {
                let idf = self.idf(entry.df);
                for posting in
                    entry.postings.iter().filter(|p| fields.contains(&p.field))
                {
                    clause_records.insert(posting.record);
                    if clause.presence == Presence::Prohibited {
                        continue;
                    }
                    *scores.entry(posting.record).or_default() += idf
                        * self.bm25(posting)
                        * posting.field.boost()
                        * clause.boost;
                    matches
                        .entry(posting.record)
                        .or_default()
                        .insert(term, posting.field);
                }
            }

            match clause.presence {
                Presence::Required => {
                    has_positive = true;
                    required = Some(match required {
                        Some(set) => set
                            .intersection(&clause_records)
                            .copied()
                            .collect(),
                        None => clause_records,
                    });
                }
                Presence::Prohibited => prohibited.extend(clause_records),
                Presence::Optional => has_positive = true,
            }
        }

        let candidates: Vec<u32> = if has_positive {
            scores.keys().copied().collect()
        } else if query.clauses.is_empty() {
            Vec::new()
        } else {
            (0..self.index.refs.len() as u32).collect()
        };

        let mut hits: Vec<(u32, IndexHit)> = candidates
            .into_iter()
            .filter(|r| required.as_ref().is_none_or(|set| set.contains(r)))
            .filter(|r| !prohibited.contains(r))
            .map(|record| {
                let hit = IndexHit {
                    reference: self.index.refs[record as usize].clone(),
                    score: scores.get(&record).copied().unwrap_or_default(),
                    match_data: matches.remove(&record).unwrap_or_default(),
                };
                (record, hit)
            })
            .collect();

        hits.sort_by(|(ra, a), (rb, b)| {
            b.score.total_cmp(&a.score).then(ra.cmp(rb))
        });
        hits.into_iter().map(|(_, hit)| hit).collect()
    }

    /// Dictionary terms a clause resolves to.
    fn expand(&self, clause: &Clause) -> Vec<(&str, &TermEntry)> {
        let candidates = if clause.use_pipeline {
            analyze(&self.analyzer, &clause.term)
        } else {
            vec![clause.term.clone()]
        };

        let mut expanded: BTreeMap<&str, &TermEntry> = BTreeMap::new();
        for candidate in &candidates {
            if candidate.contains('*') {
                expanded.extend(self.wildcard_terms(candidate));
            } else if clause.edit_distance > 0 {
                expanded.extend(self.index.terms.iter().filter_map(|(term, entry)| {
                    (levenshtein(term, candidate)
                        <= usize::from(clause.edit_distance))
                    .then_some((term.as_str(), entry))
                }));
            } else if let Some((term, entry)) =
                self.index.terms.get_key_value(candidate.as_str())
            {
                expanded.insert(term.as_str(), entry);
            }
        }
        expanded.into_iter().collect()
    }

    fn wildcard_terms(&self, pattern: &str) -> Vec<(&str, &TermEntry)> {
        let prefix = pattern.split('*').next().unwrap_or_default();
        self.index
            .terms
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(term, _)| term.starts_with(prefix))
            .filter(|(term, _)| glob_match(pattern, term))
            .map(|(term, entry)| (term.as_str(), entry))
            .collect()
    }

    fn idf(&self, df: u32) -> f32 {
        let n = self.index.refs.len() as f32;
        let df = df as f32;
        (1.0 + ((n - df + 0.5) / (df + 0.5)).abs()).ln()
    }

    fn bm25(&self, posting: &Posting) -> f32 {
        let slot = posting.field.slot();
        let length = self.index.field_lengths[posting.record as usize][slot] as f32;
        let average = self.index.average_field_lengths[slot];
        let norm = if average > 0.0 { length / average } else { 1.0 };
        let tf = posting.tf as f32;
        (BM25_K1 + 1.0) * tf / (BM25_K1 * (1.0 - BM25_B + BM25_B * norm) + tf)
    }
}

impl fmt::Debug for Searcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Searcher")
            .field("records", &self.index.len())
            .finish_non_exhaustive()
    }
}

/// Match `text` against a pattern where `*` stands for any run of
/// characters.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, t));
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            current[j + 1] = (previous[j] + cost)
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
