use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::{
    artifact::SearchArtifact,
    catalog::{ContentSource, PageMeta},
    config::{BuildConfig, SearchSettings},
    document::{Document, Store, component_version_key},
    error::Result,
    extract::extract,
    index::{Field, IndexBuilder},
    language::LanguageSet,
};

/// Build the index and store for every indexable page of `source`.
///
/// The configuration and language registry are validated before the source
/// is asked for any page. Returns `None` when no page is indexable, in which
/// case nothing should be published.
pub fn generate_index(
    source: &dyn ContentSource,
    config: &BuildConfig,
) -> Result<Option<SearchArtifact>> {
    let languages = config.validate()?;

    let latest_only = config.index_latest_only;
    let latest: BTreeMap<String, String> = if latest_only {
        source
            .components()
            .into_iter()
            .map(|c| (c.name, c.latest_version))
            .collect()
    } else {
        BTreeMap::new()
    };
    let predicate = |meta: &PageMeta| {
        meta.out
            && (!latest_only
                || latest.get(&meta.src.component) == Some(&meta.src.version))
    };

    let pages = source.pages(&predicate)?;
    debug!(pages = pages.len(), "selected pages");

    let site_root = config.site_root();
    let mut documents = Vec::new();
    for page in &pages {
        let id = documents.len() as u32 + 1;
        if let Some(mut document) = extract(page, id) {
            document.url = format!("{site_root}{}", document.url);
            documents.push(document);
        }
    }

    if documents.is_empty() {
        info!("no indexable pages, skipping index");
        return Ok(None);
    }

    let artifact =
        build(documents, languages, source, config.search_settings())?;
    info!(
        documents = artifact.store.documents.len(),
        records = artifact.index.len(),
        terms = artifact.index.term_count(),
        "built search index"
    );
    Ok(Some(artifact))
}

/// Like [`generate_index`], parsing the configuration from raw JSON first.
///
/// Unknown keys fail here, before the source is touched.
pub fn generate_index_from_value(
    source: &dyn ContentSource,
    config: serde_json::Value,
) -> Result<Option<SearchArtifact>> {
    let config = BuildConfig::from_value(config)?;
    generate_index(source, &config)
}

fn build(
    documents: Vec<Document>,
    languages: LanguageSet,
    source: &dyn ContentSource,
    settings: SearchSettings,
) -> Result<SearchArtifact> {
    let mut builder = IndexBuilder::new(languages);

    for doc in &documents {
        for title in &doc.titles {
            builder.add(
                &format!("{}-{}", doc.id, title.id),
                &[(Field::Title, title.text.as_str())],
            )?;
        }
        builder.add(
            &doc.id.to_string(),
            &[
                (Field::Title, doc.title.as_str()),
                (Field::Name, doc.name.as_str()),
                (Field::Component, doc.component.as_str()),
                (Field::Text, doc.text.as_str()),
            ],
        )?;
    }

    let component_versions = source
        .components()
        .into_iter()
        .flat_map(|c| c.versions)
        .map(|cv| (component_version_key(&cv.name, &cv.version), cv))
        .collect();

    Ok(SearchArtifact {
        index: builder.build(),
        store: Store {
            documents: documents.into_iter().map(|d| (d.id, d)).collect(),
            component_versions,
        },
        settings,
    })
}
