//! Grouped, highlighted result model and its terminal rendering.

use std::fmt::Write as _;

use serde::Serialize;
use tracing::{debug, error};

use crate::{
    document::Store,
    error::{Error, Result},
    highlight::{Node, highlight},
    index::Field,
    query::Tier,
    search::{Facet, Hit, SearchContext},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    #[serde(rename = "ref")]
    pub reference: String,
    pub url: String,
    pub score: f32,
    pub title: Vec<Node>,
    /// Highlighted heading, for hits on a single section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<Vec<Node>>,
    pub snippet: Vec<Node>,
}

/// Hits belonging to one component version.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultGroup {
    pub component: String,
    pub version: String,
    pub title: String,
    pub display_version: String,
    pub items: Vec<ResultItem>,
}

impl ResultGroup {
    pub fn label(&self) -> String {
        format!("{} {}", self.title, self.display_version)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    pub tier: Option<Tier>,
    pub groups: Vec<ResultGroup>,
}

impl SearchResponse {
    /// Search and build the response, never failing.
    ///
    /// A malformed query is expected while the user is typing and is only
    /// logged at debug level. Anything else is logged as an error. Both
    /// produce an empty response.
    pub fn respond(
        context: &SearchContext,
        query: &str,
        facet: Option<&Facet>,
    ) -> Self {
        let result = context.search(query, facet).and_then(|hits| {
            Self::from_hits(context, query, hits.tier, &hits.hits)
        });
        match result {
            Ok(response) => response,
            Err(e) if e.is_query_parse() => {
                debug!(query, error = %e, "could not parse query");
                Self::empty(query)
            }
            Err(e) => {
                error!(query, error = %e, "unexpected error while searching");
                Self::empty(query)
            }
        }
    }

    pub fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            tier: None,
            groups: Vec::new(),
        }
    }

    /// Group `hits` by component version, in order of first appearance.
    pub fn from_hits(
        context: &SearchContext,
        query: &str,
        tier: Option<Tier>,
        hits: &[Hit],
    ) -> Result<Self> {
        let store = context.store();
        let snippet_length = context.settings().snippet_length;

        let mut groups: Vec<ResultGroup> = Vec::new();
        for hit in hits {
            let document = store.document(hit.reference.document_id())?;
            let item = result_item(store, hit, snippet_length)?;

            if let Some(group) = groups.iter_mut().find(|g| {
                g.component == document.component
                    && g.version == document.version
            }) {
                group.items.push(item);
                continue;
            }

            let (title, display_version) = store
                .component_version(&document.component, &document.version)
                .map(|cv| (cv.title.clone(), cv.display_version.clone()))
                .unwrap_or_else(|| {
                    (document.component.clone(), document.version.clone())
                });
            groups.push(ResultGroup {
                component: document.component.clone(),
                version: document.version.clone(),
                title,
                display_version,
                items: vec![item],
            });
        }

        Ok(Self {
            query: query.to_string(),
            tier,
            groups,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn hit_count(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }

    pub fn no_results_message(&self) -> String {
        format!("No results for query \"{}\"", self.query)
    }

    /// Plain-text rendering; marked text is wrapped in `*`.
    pub fn to_text(&self) -> String {
        if self.is_empty() {
            return self.no_results_message();
        }

        let mut out = String::new();
        for group in &self.groups {
            let _ = writeln!(out, "{}", group.label());
            for item in &group.items {
                let mut title = render_nodes(&item.title);
                if let Some(section) = &item.section {
                    let _ = write!(title, " > {}", render_nodes(section));
                }
                let _ = writeln!(out, "  {title}");
                let _ = writeln!(out, "    {}", item.url);
                let snippet = render_nodes(&item.snippet);
                if !snippet.is_empty() {
                    let _ = writeln!(out, "    {snippet}");
                }
            }
        }
        out
    }
}

fn result_item(
    store: &Store,
    hit: &Hit,
    snippet_length: usize,
) -> Result<ResultItem> {
    let document = store.document(hit.reference.document_id())?;
    let title_terms = hit.match_data.terms_in(Field::Title);
    let text_terms = hit.match_data.terms_in(Field::Text);

    let (url, section) = match hit.reference.sub_title_id() {
        Some(id) => {
            let sub_title =
                document.sub_title(id).ok_or_else(|| Error::NotFound {
                    kind: "section",
                    name: hit.reference.to_string(),
                })?;
            let url = if sub_title.hash.is_empty() {
                document.url.clone()
            } else {
                format!("{}#{}", document.url, sub_title.hash)
            };
            let section =
                highlight(&sub_title.text, &title_terms, snippet_length);
            (url, Some(section))
        }
        None => (document.url.clone(), None),
    };

    Ok(ResultItem {
        reference: hit.reference.to_string(),
        url,
        score: hit.score,
        title: highlight(&document.title, &title_terms, snippet_length),
        section,
        snippet: highlight(&document.text, &text_terms, snippet_length),
    })
}

fn render_nodes(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(|node| match node {
            Node::Text(text) => text.clone(),
            Node::Mark(text) => format!("*{text}*"),
        })
        .collect()
}
