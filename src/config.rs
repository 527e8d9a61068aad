use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    language::{DEFAULT_LANGUAGE, LanguageSet},
};

/// Default number of characters shown on each side of the first match.
pub const DEFAULT_SNIPPET_LENGTH: usize = 100;

/// Options recognized by the index build. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct BuildConfig {
    pub snippet_length: usize,
    pub languages: Vec<String>,
    pub index_latest_only: bool,
    pub site_root_path: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            snippet_length: DEFAULT_SNIPPET_LENGTH,
            languages: vec![DEFAULT_LANGUAGE.to_string()],
            index_latest_only: false,
            site_root_path: String::new(),
        }
    }
}

impl BuildConfig {
    /// Parse a configuration from a JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| {
            Error::Config(format!("invalid search configuration: {e}"))
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            Error::Config(format!("invalid search configuration: {e}"))
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check value ranges and resolve the language registry.
    ///
    /// Returns the resolved languages so callers do not resolve twice.
    pub fn validate(&self) -> Result<LanguageSet> {
        if self.snippet_length == 0 {
            return Err(Error::Config(
                "snippetLength must be greater than zero".into(),
            ));
        }
        LanguageSet::resolve(&self.languages)
    }

    /// Root path prefixed to every page URL, without a trailing slash.
    pub fn site_root(&self) -> &str {
        self.site_root_path.trim_end_matches('/')
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            snippet_length: self.snippet_length,
        }
    }
}

/// Settings used by the query side once an index is loaded.
///
/// Published alongside the index so a loaded artifact searches the way it
/// was configured. Page URLs in the store already carry the site root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchSettings {
    pub snippet_length: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        BuildConfig::default().search_settings()
    }
}
