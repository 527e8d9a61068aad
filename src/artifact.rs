//! The published search asset: index plus document store, as one JSON file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    config::SearchSettings,
    document::Store,
    error::{Error, Result},
    index::{InvertedIndex, Searcher},
    search::SearchContext,
};

/// Site-relative path of the published asset.
pub const INDEX_ASSET_PATH: &str = "search-index.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchArtifact {
    pub index: InvertedIndex,
    pub store: Store,
    #[serde(default)]
    pub settings: SearchSettings,
}

impl SearchArtifact {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::NotFound {
                kind: "search index",
                name: path.display().to_string(),
            });
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// Write `artifact` to `INDEX_ASSET_PATH` under `output_dir`.
///
/// An absent artifact (nothing indexable) writes nothing and returns `None`.
pub fn publish(
    artifact: Option<&SearchArtifact>,
    output_dir: &Path,
) -> Result<Option<PathBuf>> {
    let Some(artifact) = artifact else {
        info!("nothing to publish");
        return Ok(None);
    };
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(INDEX_ASSET_PATH);
    std::fs::write(&path, artifact.to_json()?)?;
    info!(path = %path.display(), "published search index");
    Ok(Some(path))
}

/// Turn a loaded artifact into a ready-to-query context.
///
/// `settings` overrides the settings published with the artifact.
pub fn init_search(
    artifact: SearchArtifact,
    settings: Option<SearchSettings>,
) -> SearchContext {
    SearchContext::new(
        Searcher::new(artifact.index),
        artifact.store,
        settings.unwrap_or(artifact.settings),
    )
}
