//! Static registry of supported index languages.
//!
//! Each language code resolves to a stemmer and, for scripts that are not
//! whitespace-segmentable, a segmenter. Codes are resolved once, when the
//! build configuration is validated, so an unsupported code fails before any
//! page is read.

use serde::{Deserialize, Serialize};
use tantivy::tokenizer::{
    Language as StemLanguage,
    LowerCaser,
    RemoveLongFilter,
    Stemmer,
    TextAnalyzer,
    TokenStream,
};

use crate::{
    error::{Error, Result},
    tokenizer::SiteTokenizer,
};

/// The language used when the configuration names none.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Tokens longer than this are dropped from the index.
const MAX_TOKEN_LENGTH: usize = 80;

/// How words are cut out of text for a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segmenter {
    /// Words are separated by whitespace and punctuation.
    Whitespace,
    /// Han and kana runs are cut into single characters.
    Cjk,
}

#[derive(Debug, Clone, Copy)]
pub struct LanguageSupport {
    pub code: &'static str,
    pub stemmer: Option<StemLanguage>,
    pub segmenter: Segmenter,
}

const fn stemmed(code: &'static str, lang: StemLanguage) -> LanguageSupport {
    LanguageSupport {
        code,
        stemmer: Some(lang),
        segmenter: Segmenter::Whitespace,
    }
}

const fn segmented(code: &'static str) -> LanguageSupport {
    LanguageSupport {
        code,
        stemmer: None,
        segmenter: Segmenter::Cjk,
    }
}

static REGISTRY: &[LanguageSupport] = &[
    stemmed("ar", StemLanguage::Arabic),
    stemmed("da", StemLanguage::Danish),
    stemmed("de", StemLanguage::German),
    stemmed("el", StemLanguage::Greek),
    stemmed("en", StemLanguage::English),
    stemmed("es", StemLanguage::Spanish),
    stemmed("fi", StemLanguage::Finnish),
    stemmed("fr", StemLanguage::French),
    stemmed("hu", StemLanguage::Hungarian),
    stemmed("it", StemLanguage::Italian),
    stemmed("nl", StemLanguage::Dutch),
    stemmed("no", StemLanguage::Norwegian),
    stemmed("pt", StemLanguage::Portuguese),
    stemmed("ro", StemLanguage::Romanian),
    stemmed("ru", StemLanguage::Russian),
    stemmed("sv", StemLanguage::Swedish),
    stemmed("ta", StemLanguage::Tamil),
    stemmed("tr", StemLanguage::Turkish),
    segmented("ja"),
    segmented("zh"),
];

/// Codes that are known languages but have no segmenter available.
const MISSING_SEGMENTER: &[&str] = &["th", "lo", "km", "my"];

/// Look up a single language code.
pub fn resolve(code: &str) -> Result<LanguageSupport> {
    let normalized = code.trim().to_lowercase();
    if let Some(support) = REGISTRY.iter().find(|l| l.code == normalized) {
        return Ok(*support);
    }
    let reason = if MISSING_SEGMENTER.contains(&normalized.as_str()) {
        "no word segmenter is registered for this script"
    } else {
        "no stemmer is registered for this code"
    };
    Err(Error::UnsupportedLanguage {
        code: code.to_string(),
        reason,
    })
}

/// The resolved set of languages an index is built with.
///
/// Serialized as the list of codes; the analyzer is rebuilt from the
/// registry when an index is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LanguageSet {
    languages: Vec<LanguageSupport>,
}

impl PartialEq for LanguageSupport {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for LanguageSupport {}

impl LanguageSet {
    pub fn resolve<S: AsRef<str>>(codes: &[S]) -> Result<Self> {
        if codes.is_empty() {
            return Err(Error::Config(
                "at least one language must be configured".into(),
            ));
        }
        let mut languages: Vec<LanguageSupport> = Vec::new();
        for code in codes {
            let support = resolve(code.as_ref())?;
            if !languages.contains(&support) {
                languages.push(support);
            }
        }
        Ok(Self { languages })
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.languages.iter().map(|l| l.code).collect()
    }

    /// A lone default language keeps the plain pipeline; anything else
    /// switches to the multi-language pipeline.
    pub fn is_default(&self) -> bool {
        matches!(self.languages.as_slice(), [only] if only.code == DEFAULT_LANGUAGE)
    }

    fn needs_segmenter(&self) -> bool {
        self.languages.iter().any(|l| l.segmenter == Segmenter::Cjk)
    }

    /// Build the text analyzer used both for indexing and for query terms
    /// that go through the stemming pipeline.
    pub fn analyzer(&self) -> TextAnalyzer {
        if self.is_default() {
            return TextAnalyzer::builder(SiteTokenizer::default())
                .filter(RemoveLongFilter::limit(MAX_TOKEN_LENGTH))
                .filter(LowerCaser)
                .filter(Stemmer::new(StemLanguage::English))
                .build();
        }

        let mut builder =
            TextAnalyzer::builder(SiteTokenizer::new(self.needs_segmenter()))
                .filter(RemoveLongFilter::limit(MAX_TOKEN_LENGTH))
                .filter(LowerCaser)
                .dynamic();
        for stemmer in self.languages.iter().filter_map(|l| l.stemmer) {
            builder = builder.filter_dynamic(Stemmer::new(stemmer));
        }
        builder.build()
    }
}

impl Default for LanguageSet {
    fn default() -> Self {
        Self {
            languages: vec![stemmed(DEFAULT_LANGUAGE, StemLanguage::English)],
        }
    }
}

impl TryFrom<Vec<String>> for LanguageSet {
    type Error = Error;

    fn try_from(codes: Vec<String>) -> Result<Self> {
        Self::resolve(&codes)
    }
}

impl From<LanguageSet> for Vec<String> {
    fn from(set: LanguageSet) -> Self {
        set.codes().into_iter().map(str::to_string).collect()
    }
}

/// Run `text` through `analyzer` and collect the resulting terms.
pub fn analyze(analyzer: &TextAnalyzer, text: &str) -> Vec<String> {
    let mut analyzer = analyzer.clone();
    let mut stream = analyzer.token_stream(text);
    let mut terms = Vec::new();
    while stream.advance() {
        terms.push(stream.token().text.clone());
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_registered_codes() {
        let set = LanguageSet::resolve(&["en", "FR"]).unwrap();
        assert_eq!(set.codes(), vec!["en", "fr"]);
        assert!(!set.is_default());
    }

    #[test]
    fn single_english_is_default_pipeline() {
        let set = LanguageSet::resolve(&["en"]).unwrap();
        assert!(set.is_default());
        assert_eq!(set, LanguageSet::default());
    }

    #[test]
    fn single_non_default_language_is_multi_pipeline() {
        let set = LanguageSet::resolve(&["de"]).unwrap();
        assert!(!set.is_default());
    }

    #[test]
    fn unknown_code_is_an_error() {
        let err = LanguageSet::resolve(&["en", "xx"]).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedLanguage { ref code, .. } if code == "xx"
        ));
    }

    #[test]
    fn script_without_segmenter_is_an_error() {
        let err = resolve("th").unwrap_err();
        assert!(err.to_string().contains("segmenter"));
    }

    #[test]
    fn empty_language_list_is_rejected() {
        let codes: [&str; 0] = [];
        assert!(matches!(
            LanguageSet::resolve(&codes),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn default_analyzer_stems_and_lowercases() {
        let analyzer = LanguageSet::default().analyzer();
        assert_eq!(analyze(&analyzer, "Running Runners"), vec!["run", "runner"]);
    }

    #[test]
    fn multi_language_analyzer_applies_each_stemmer() {
        let set = LanguageSet::resolve(&["da"]).unwrap();
        let analyzer = set.analyzer();
        assert_eq!(analyze(&analyzer, "Danmarks"), vec!["danmark"]);
    }

    #[test]
    fn japanese_analyzer_segments_kanji() {
        let set = LanguageSet::resolve(&["ja", "en"]).unwrap();
        let analyzer = set.analyzer();
        assert_eq!(analyze(&analyzer, "東京 guides"), vec!["東", "京", "guid"]);
    }

    #[test]
    fn serializes_as_code_list() {
        let set = LanguageSet::resolve(&["en", "de"]).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["en","de"]"#);
        let back: LanguageSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
