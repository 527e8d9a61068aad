use std::path::Path;

use serde_json::json;
use sitesearch::{
    BuildConfig,
    Catalog,
    Error,
    Facet,
    Node,
    Ref,
    SearchArtifact,
    SearchContext,
    SearchResponse,
    SiteDirectory,
    artifact,
    ingestion,
    query::Tier,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn write_page(root: &Path, relative: &str, html: &str) -> TestResult {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{title}</title></head><body>\
         <nav class=\"nav\"><a href=\"/\">Home</a></nav>\
         <main><article class=\"doc\"><h1 class=\"page\">{title}</h1>{body}\
         <nav class=\"pagination\"><a>Next</a></nav></article></main>\
         </body></html>"
    )
}

fn fixture_site(root: &Path) -> TestResult {
    write_page(
        root,
        "server/2.1/install.html",
        &page(
            "Installing the server",
            "<p>Download the distribution and run the installer.</p>\
             <h2 id=\"_requirements\">Requirements</h2>\
             <p>A Java runtime is required.</p>\
             <h2 id=\"_tuning\">Heap tuning</h2>",
        ),
    )?;
    write_page(
        root,
        "server/2.1/configure.html",
        &page(
            "Configuration",
            "<p>Settings live in the server configuration file.</p>",
        ),
    )?;
    write_page(
        root,
        "server/1.4/install.html",
        &page("Installing", "<p>Legacy installation instructions.</p>"),
    )?;
    write_page(
        root,
        "client/1.0/index.html",
        &page("Client library", "<p>Connect to the server over HTTP.</p>"),
    )?;
    write_page(
        root,
        "client/1.0/internal.html",
        "<html><head><meta name=\"robots\" content=\"noindex\"></head>\
         <body><h1>Internal</h1><p>Do not index.</p></body></html>",
    )?;
    write_page(root, "_/js/site.html", "<p>UI bundle</p>")?;
    Ok(())
}

fn build_site(
    root: &Path,
    config: &BuildConfig,
) -> Result<SearchContext, Box<dyn std::error::Error>> {
    fixture_site(root)?;
    let site = SiteDirectory::open(root)?;
    let built = ingestion::generate_index(&site, config)?;
    let path = artifact::publish(built.as_ref(), root)?
        .ok_or("expected an index to be published")?;
    let loaded = SearchArtifact::load(&path)?;
    Ok(artifact::init_search(loaded, None))
}

#[test]
fn document_ids_follow_catalog_order() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let context = build_site(tmp.path(), &BuildConfig::default())?;

    let urls: Vec<_> = context
        .store()
        .documents
        .iter()
        .map(|(id, doc)| (*id, doc.url.clone()))
        .collect();
    // The noindex page is skipped without consuming an id.
    assert_eq!(
        urls,
        vec![
            (1, "/client/1.0/index.html".to_string()),
            (2, "/server/1.4/install.html".to_string()),
            (3, "/server/2.1/configure.html".to_string()),
            (4, "/server/2.1/install.html".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn sub_title_ids_reset_per_document() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let context = build_site(tmp.path(), &BuildConfig::default())?;
    let install = context.store().document(4)?;
    let ids: Vec<_> = install.titles.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(install.titles[1].hash, "_tuning");
    assert!(!install.text.contains("Next"));
    assert!(!install.text.contains("Requirements"));
    Ok(())
}

#[test]
fn heading_only_term_returns_section() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let context = build_site(tmp.path(), &BuildConfig::default())?;
    let hits = context.search("heap", None)?;
    assert_eq!(hits.tier, Some(Tier::Exact));
    assert_eq!(
        hits.hits[0].reference,
        Ref::Section {
            document: 4,
            title: 2
        }
    );

    let response = SearchResponse::respond(&context, "heap", None);
    let item = &response.groups[0].items[0];
    assert_eq!(item.url, "/server/2.1/install.html#_tuning");
    Ok(())
}

#[test]
fn facet_never_admits_other_documents() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let context = build_site(tmp.path(), &BuildConfig::default())?;
    let facet: Facet = "component:client".parse()?;
    for query in ["server", "install*", "*erv*", "http"] {
        for hit in context.search(query, Some(&facet))?.iter() {
            let doc = context.store().document(hit.reference.document_id())?;
            assert_eq!(doc.component, "client", "query {query}");
        }
    }
    Ok(())
}

#[test]
fn mid_word_term_falls_through_to_substring() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let context = build_site(tmp.path(), &BuildConfig::default())?;
    let hits = context.search("istribu", None)?;
    assert_eq!(hits.tier, Some(Tier::Substring));
    assert_eq!(hits.hits[0].reference, Ref::Document(4));
    Ok(())
}

#[test]
fn latest_only_and_site_root() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let config = BuildConfig {
        index_latest_only: true,
        site_root_path: "/docs".into(),
        ..BuildConfig::default()
    };
    let context = build_site(tmp.path(), &config)?;
    let versions: Vec<_> = context
        .store()
        .documents
        .values()
        .map(|d| d.version.as_str())
        .collect();
    assert!(!versions.contains(&"1.4"));
    assert!(
        context
            .store()
            .documents
            .values()
            .all(|d| d.url.starts_with("/docs/"))
    );
    // Component metadata still lists every version.
    assert!(context.store().component_version("server", "1.4").is_some());
    Ok(())
}

#[test]
fn wildcard_matches_every_inflection_in_exact_tier() -> TestResult {
    let mut catalog = Catalog::new();
    catalog
        .add_component("atlas", "Atlas", &["1.0"])
        .add_page("atlas", "1.0", "dk", &page("Danmark", "<p>Landet.</p>"))
        .add_page(
            "atlas",
            "1.0",
            "history",
            &page("Historie", "<p>Danmarks historie.</p>"),
        );
    let built = ingestion::generate_index_from_value(
        &catalog,
        json!({ "languages": ["da"] }),
    )?
    .ok_or("expected an index")?;
    let context = artifact::init_search(built, None);

    let hits = context.search("Danmark*", None)?;
    assert_eq!(hits.tier, Some(Tier::Exact));
    assert_eq!(hits.len(), 2);
    Ok(())
}

#[test]
fn cjk_pages_are_searchable() -> TestResult {
    let mut catalog = Catalog::new();
    catalog
        .add_component("guide", "Guide", &["1.0"])
        .add_page(
            "guide",
            "1.0",
            "tokyo",
            &page("東京ガイド", "<p>東京の観光案内です。</p>"),
        )
        .add_page("guide", "1.0", "osaka", &page("大阪", "<p>大阪城。</p>"));
    let config = BuildConfig {
        languages: vec!["ja".into(), "en".into()],
        ..BuildConfig::default()
    };
    let built = ingestion::generate_index(&catalog, &config)?
        .ok_or("expected an index")?;
    let context = artifact::init_search(built, None);

    let hits = context.search("+東 +京", None)?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits.hits[0].reference, Ref::Document(1));
    Ok(())
}

#[test]
fn unknown_config_key_is_fatal() {
    let catalog = Catalog::new();
    let err = ingestion::generate_index_from_value(
        &catalog,
        json!({ "fooBar": 1 }),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn empty_site_publishes_nothing() -> TestResult {
    let tmp = tempfile::tempdir()?;
    write_page(
        tmp.path(),
        "guide/1.0/secret.html",
        "<html><head><meta name=\"robots\" content=\"noindex\"></head></html>",
    )?;
    let site = SiteDirectory::open(tmp.path())?;
    let built = ingestion::generate_index(&site, &BuildConfig::default())?;
    assert!(built.is_none());
    assert!(artifact::publish(built.as_ref(), tmp.path())?.is_none());
    assert!(!tmp.path().join(sitesearch::INDEX_ASSET_PATH).exists());
    Ok(())
}

#[test]
fn snippets_are_bounded_and_marked() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let config = BuildConfig {
        snippet_length: 12,
        ..BuildConfig::default()
    };
    let context = build_site(tmp.path(), &config)?;
    let response = SearchResponse::respond(&context, "runtime", None);
    assert_eq!(response.hit_count(), 1);

    let snippet = &response.groups[0].items[0].snippet;
    assert!(snippet.contains(&Node::Mark("runtime".into())));
    let shown: usize = snippet.iter().map(|n| n.text().chars().count()).sum();
    let body = context.store().document(4)?.text.chars().count();
    assert!(shown < body);
    Ok(())
}

#[test]
fn configured_snippet_length_is_published_with_the_index() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let mut catalog = Catalog::new();
    catalog.add_component("hay", "Haystack", &["1.0"]).add_page(
        "hay",
        "1.0",
        "stack",
        &page(
            "Haystack",
            "<p>alpha beta gamma delta epsilon zeta needle eta theta iota \
             kappa lambda mu</p>",
        ),
    );
    let built = ingestion::generate_index_from_value(
        &catalog,
        json!({ "snippetLength": 10 }),
    )?;
    let path = artifact::publish(built.as_ref(), tmp.path())?
        .ok_or("expected an index to be published")?;

    let context = artifact::init_search(SearchArtifact::load(&path)?, None);
    assert_eq!(context.settings().snippet_length, 10);

    let response = SearchResponse::respond(&context, "needle", None);
    assert_eq!(
        response.groups[0].items[0].snippet,
        vec![
            Node::Text("...epsilon zeta ".into()),
            Node::Mark("needle".into()),
            Node::Text(" eta theta...".into()),
        ]
    );
    Ok(())
}

#[test]
fn malformed_query_is_distinct_from_no_results() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let context = build_site(tmp.path(), &BuildConfig::default())?;
    let err = context.search("\"unterminated", None).unwrap_err();
    assert!(err.is_query_parse());
    assert!(context.search("nonexistentword", None)?.is_empty());

    let response = SearchResponse::respond(&context, "\"unterminated", None);
    assert_eq!(
        response.to_text(),
        "No results for query \"\"unterminated\""
    );
    Ok(())
}
