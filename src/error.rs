use crate::query::QueryParseError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unsupported language `{code}`: {reason}")]
    UnsupportedLanguage { code: String, reason: &'static str },

    #[error("invalid query: {0}")]
    QueryParse(#[from] QueryParseError),

    #[error("invalid facet filter `{0}`, expected `field:value`")]
    InvalidFacet(String),

    #[error("duplicate index ref: {0}")]
    DuplicateRef(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },
}

impl Error {
    /// Whether this error comes from user query syntax rather than from a
    /// broken index or store.
    pub fn is_query_parse(&self) -> bool {
        matches!(self, Self::QueryParse(_))
    }
}
