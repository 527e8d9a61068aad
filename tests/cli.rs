use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn sitesearch_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_sitesearch"))
}

fn run(args: &[&str]) -> Result<Output, Box<dyn std::error::Error>> {
    Ok(Command::new(sitesearch_bin())
        .args(args)
        .env("SITESEARCH_LOG", "warn")
        .output()?)
}

fn setup_site(root: &Path) -> TestResult {
    let pages = [
        (
            "guide/1.0/install.html",
            "<article class=\"doc\"><h1 class=\"page\">Install</h1>\
             <p>Unpack the archive.</p>\
             <h2 id=\"_ports\">Ports</h2></article>",
        ),
        (
            "guide/1.0/upgrade.html",
            "<article class=\"doc\"><h1 class=\"page\">Upgrade</h1>\
             <p>Back up the archive first.</p></article>",
        ),
    ];
    for (relative, html) in pages {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().ok_or("no parent")?)?;
        std::fs::write(path, html)?;
    }
    Ok(())
}

#[test]
fn build_then_search_json() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let site = tmp.path().join("site");
    let out = tmp.path().join("out");
    setup_site(&site)?;

    let build = run(&[
        "build",
        site.to_str().ok_or("path")?,
        "--output",
        out.to_str().ok_or("path")?,
    ])?;
    assert!(build.status.success(), "{build:?}");
    let index = out.join("search-index.json");
    assert!(index.is_file());

    let search = run(&[
        "search",
        "archive",
        "--index",
        index.to_str().ok_or("path")?,
        "--json",
    ])?;
    assert!(search.status.success(), "{search:?}");
    let response: serde_json::Value = serde_json::from_slice(&search.stdout)?;
    assert_eq!(response["tier"], "exact");
    let items = response["groups"][0]["items"]
        .as_array()
        .ok_or("items")?;
    assert_eq!(items.len(), 2);
    Ok(())
}

#[test]
fn search_prints_placeholder_for_bad_query() -> TestResult {
    let tmp = tempfile::tempdir()?;
    setup_site(tmp.path())?;
    let site = tmp.path().to_str().ok_or("path")?;
    assert!(run(&["build", site])?.status.success());

    let index = tmp.path().join("search-index.json");
    let search = run(&[
        "search",
        "title:",
        "--index",
        index.to_str().ok_or("path")?,
    ])?;
    assert!(search.status.success());
    let stdout = String::from_utf8(search.stdout)?;
    assert_eq!(stdout.trim_end(), "No results for query \"title:\"");
    Ok(())
}

#[test]
fn unknown_config_key_fails_without_writing() -> TestResult {
    let tmp = tempfile::tempdir()?;
    setup_site(tmp.path())?;
    let config = tmp.path().join("search.json");
    std::fs::write(&config, r#"{"fooBar": 1}"#)?;

    let build = run(&[
        "build",
        tmp.path().to_str().ok_or("path")?,
        "--config",
        config.to_str().ok_or("path")?,
    ])?;
    assert!(!build.status.success());
    assert!(String::from_utf8(build.stderr)?.contains("fooBar"));
    assert!(!tmp.path().join("search-index.json").exists());
    Ok(())
}

#[test]
fn unsupported_language_is_rejected() -> TestResult {
    let tmp = tempfile::tempdir()?;
    setup_site(tmp.path())?;
    let build = run(&[
        "build",
        tmp.path().to_str().ok_or("path")?,
        "--language",
        "th",
    ])?;
    assert!(!build.status.success());
    assert!(!tmp.path().join("search-index.json").exists());
    Ok(())
}

#[test]
fn search_uses_snippet_length_from_build_config() -> TestResult {
    let tmp = tempfile::tempdir()?;
    setup_site(tmp.path())?;
    let config = tmp.path().join("search.json");
    std::fs::write(&config, r#"{"snippetLength": 3}"#)?;
    let site = tmp.path().to_str().ok_or("path")?;
    assert!(
        run(&["build", site, "--config", config.to_str().ok_or("path")?])?
            .status
            .success()
    );

    let index = tmp.path().join("search-index.json");
    let search = run(&[
        "search",
        "archive",
        "--index",
        index.to_str().ok_or("path")?,
        "--json",
    ])?;
    assert!(search.status.success(), "{search:?}");
    let response: serde_json::Value = serde_json::from_slice(&search.stdout)?;
    let snippets: Vec<&serde_json::Value> = response["groups"][0]["items"]
        .as_array()
        .ok_or("items")?
        .iter()
        .map(|item| &item["snippet"])
        .collect();
    assert!(snippets.contains(&&serde_json::json!([
        { "type": "text", "text": "...the " },
        { "type": "mark", "text": "archive" },
        { "type": "text", "text": " fi..." },
    ])));
    Ok(())
}
