//! Tiered search over a loaded index.
//!
//! A query runs as written first. Only when that yields no hit (after facet
//! filtering) is it retried with trailing wildcards, and only then with
//! leading and trailing wildcards. The first non-empty tier wins.

use std::{fmt, str::FromStr};

use tracing::debug;

use crate::{
    config::SearchSettings,
    document::{Document, Ref, Store},
    error::{Error, Result},
    index::{MatchData, Searcher},
    query::{Query, Tier},
};

/// A `field:value` constraint on the documents behind hits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    pub field: String,
    pub value: String,
}

impl Facet {
    pub fn matches(&self, document: &Document) -> bool {
        document.field(&self.field) == Some(self.value.as_str())
    }
}

impl FromStr for Facet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((field, value))
                if Document::FIELD_NAMES.contains(&field) && !value.is_empty() =>
            {
                Ok(Self {
                    field: field.to_string(),
                    value: value.to_string(),
                })
            }
            _ => Err(Error::InvalidFacet(s.to_string())),
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.value)
    }
}

/// A search hit resolved to its record.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub reference: Ref,
    pub score: f32,
    pub match_data: MatchData,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    /// Tier that produced the hits; `None` when every tier came up empty.
    pub tier: Option<Tier>,
    pub hits: Vec<Hit>,
}

impl SearchHits {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Hit> {
        self.hits.iter()
    }
}

/// A loaded index, its document store and the query-side settings.
///
/// Read-only once built; any number of contexts may coexist.
#[derive(Debug)]
pub struct SearchContext {
    searcher: Searcher,
    store: Store,
    settings: SearchSettings,
}

impl SearchContext {
    pub fn new(searcher: Searcher, store: Store, settings: SearchSettings) -> Self {
        Self {
            searcher,
            store,
            settings,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Run `query` through the exact, prefix and substring tiers in order.
    ///
    /// Syntax errors are returned as [`Error::QueryParse`] and never turned
    /// into an empty result here.
    pub fn search(
        &self,
        query: &str,
        facet: Option<&Facet>,
    ) -> Result<SearchHits> {
        let parsed = Query::parse(query)?;
        if parsed.is_empty() {
            return Ok(SearchHits::default());
        }

        for tier in Tier::ALL {
            let hits = self.search_tier(&parsed, tier, facet)?;
            debug!(%tier, hits = hits.len(), "query tier");
            if !hits.is_empty() {
                return Ok(SearchHits {
                    tier: Some(tier),
                    hits,
                });
            }
        }
        Ok(SearchHits::default())
    }

    /// Run a single tier of `query` with facet filtering applied.
    pub fn search_tier(
        &self,
        query: &Query,
        tier: Tier,
        facet: Option<&Facet>,
    ) -> Result<Vec<Hit>> {
        let mut hits = Vec::new();
        for raw in self.searcher.query(&query.for_tier(tier)) {
            let reference: Ref = raw.reference.parse()?;
            if let Some(facet) = facet {
                let document = self.store.document(reference.document_id())?;
                if !facet.matches(document) {
                    continue;
                }
            }
            hits.push(Hit {
                reference,
                score: raw.score,
                match_data: raw.match_data,
            });
        }
        Ok(hits)
    }
}
