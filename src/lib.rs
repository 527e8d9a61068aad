//! sitesearch - full-text search for published documentation sites.
//!
//! An offline build extracts every indexable page of a site into a compact
//! inverted index plus a document store, serialized together as a single
//! `search-index.json` asset. At query time the asset is loaded into a
//! [`SearchContext`] that resolves queries through three tiers (exact, then
//! prefix, then substring) and renders highlighted, length-bounded snippets.
//!
//! Text analysis (tokenizing, lowercasing and stemming) uses
//! [Tantivy](https://github.com/quickwit-oss/tantivy)'s analyzers so that
//! documents and queries go through the same pipeline.
//!
//! # Quick start
//!
//! ```no_run
//! use sitesearch::{
//!     BuildConfig, SearchArtifact, SearchResponse, SiteDirectory, artifact,
//!     ingestion,
//! };
//!
//! let site = SiteDirectory::open("public".as_ref()).unwrap();
//! let built = ingestion::generate_index(&site, &BuildConfig::default())
//!     .unwrap();
//! artifact::publish(built.as_ref(), "public".as_ref()).unwrap();
//!
//! let loaded =
//!     SearchArtifact::load("public/search-index.json".as_ref()).unwrap();
//! let context = artifact::init_search(loaded, None);
//! let response = SearchResponse::respond(&context, "install", None);
//! println!("{}", response.to_text());
//! ```

pub mod artifact;
pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod highlight;
pub mod index;
pub mod ingestion;
pub mod language;
pub mod query;
pub mod render;
pub mod search;
pub mod tokenizer;
pub mod walker;

pub use artifact::{INDEX_ASSET_PATH, SearchArtifact, init_search};
pub use catalog::{Catalog, ContentSource};
pub use config::{BuildConfig, SearchSettings};
pub use document::{Document, Ref, Store};
pub use error::{Error, Result};
pub use highlight::Node;
pub use render::SearchResponse;
pub use search::{Facet, SearchContext};
pub use walker::SiteDirectory;
