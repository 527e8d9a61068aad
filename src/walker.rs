use std::{
    cmp::Ordering,
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use tracing::warn;

use crate::{
    catalog::{Component, ContentSource, Page, PageMeta, PageSource},
    document::ComponentVersion,
    error::{Error, Result},
};

/// A discovered page file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Path relative to the site root directory.
    pub relative_path: PathBuf,
    /// Fully resolved absolute path.
    pub absolute_path: PathBuf,
}

const PAGE_EXTENSION: &str = "html";

/// A published site tree laid out as `<component>/<version>/<path>.html`.
///
/// Files directly under the root or a component directory are not pages.
/// Hidden entries and directories starting with `_` (UI bundles, assets)
/// are skipped.
#[derive(Debug, Clone)]
pub struct SiteDirectory {
    root: PathBuf,
    files: Vec<(PageMeta, PathBuf)>,
    components: Vec<Component>,
}

impl SiteDirectory {
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::NotFound {
                kind: "site directory",
                name: root.display().to_string(),
            });
        }
        let root = root.canonicalize()?;

        let mut files = Vec::new();
        let mut versions: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for file in discover_files(&root)? {
            let Some(meta) = page_meta(&file.relative_path) else {
                continue;
            };
            let known = versions.entry(meta.src.component.clone()).or_default();
            if !known.contains(&meta.src.version) {
                known.push(meta.src.version.clone());
            }
            files.push((meta, file.absolute_path));
        }

        let components = versions
            .into_iter()
            .map(|(name, mut versions)| {
                versions.sort_by(|a, b| compare_versions(b, a));
                Component {
                    title: name.clone(),
                    latest_version: versions
                        .first()
                        .cloned()
                        .unwrap_or_default(),
                    versions: versions
                        .into_iter()
                        .map(|version| ComponentVersion {
                            name: name.clone(),
                            title: name.clone(),
                            display_version: version.clone(),
                            version,
                        })
                        .collect(),
                    name,
                }
            })
            .collect();

        Ok(Self {
            root,
            files,
            components,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of page files found, before any filtering.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ContentSource for SiteDirectory {
    fn pages(
        &self,
        predicate: &dyn Fn(&PageMeta) -> bool,
    ) -> Result<Vec<Page>> {
        let selected: Vec<_> =
            self.files.iter().filter(|(meta, _)| predicate(meta)).collect();

        // Read files in parallel; collect keeps catalog order.
        let pages: Vec<Page> = selected
            .into_par_iter()
            .filter_map(|(meta, path)| match std::fs::read_to_string(path) {
                Ok(contents) => Some(Page {
                    meta: meta.clone(),
                    contents,
                }),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unreadable page");
                    None
                }
            })
            .collect();
        Ok(pages)
    }

    fn components(&self) -> Vec<Component> {
        self.components.clone()
    }
}

fn page_meta(relative_path: &Path) -> Option<PageMeta> {
    let parts: Vec<&str> = relative_path
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    let [component, version, _, ..] = parts.as_slice() else {
        return None;
    };
    let stem = relative_path.file_stem()?.to_str()?;

    Some(PageMeta {
        out: true,
        noindex: false,
        src: PageSource {
            component: component.to_string(),
            version: version.to_string(),
            stem: stem.to_string(),
        },
        url: format!("/{}", parts.join("/")),
    })
}

/// Order version strings so that digit runs compare numerically:
/// `1.10` sorts above `1.9`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a, b);
    loop {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        let (chunk_a, rest_a) = split_chunk(a);
        let (chunk_b, rest_b) = split_chunk(b);
        let numeric = |s: &str| s.starts_with(|c: char| c.is_ascii_digit());
        let ord = if numeric(chunk_a) && numeric(chunk_b) {
            let (na, nb) = (
                chunk_a.trim_start_matches('0'),
                chunk_b.trim_start_matches('0'),
            );
            na.len().cmp(&nb.len()).then_with(|| na.cmp(nb))
        } else {
            chunk_a.cmp(chunk_b)
        };
        if ord != Ordering::Equal {
            return ord;
        }
        a = rest_a;
        b = rest_b;
    }
}

/// Split off the leading run of digits or of non-digits.
fn split_chunk(s: &str) -> (&str, &str) {
    let digits = s.starts_with(|c: char| c.is_ascii_digit());
    let end = s
        .find(|c: char| c.is_ascii_digit() != digits)
        .unwrap_or(s.len());
    s.split_at(end)
}

/// Recursively walk a directory and discover page files.
///
/// Skips hidden entries and `_`-prefixed directories. Results are sorted by
/// relative path.
pub fn discover_files(root: &Path) -> Result<Vec<DiscoveredFile>> {
    let canonical_root = root.canonicalize()?;
    let mut results = Vec::new();
    walk_dir(&canonical_root, &canonical_root, &mut results)?;
    results.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(results)
}

fn walk_dir(
    root: &Path,
    current: &Path,
    results: &mut Vec<DiscoveredFile>,
) -> Result<()> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if !name.starts_with('_') {
                walk_dir(root, &path, results)?;
            }
        } else if file_type.is_symlink() {
            // Only follow links to files; linked directories could cycle.
            let Ok(resolved) = path.canonicalize() else {
                continue;
            };
            if resolved.is_file() && is_page(&resolved) {
                results.push(discovered(root, &path, resolved));
            }
        } else if file_type.is_file() && is_page(&path) {
            let resolved = path.canonicalize()?;
            results.push(discovered(root, &path, resolved));
        }
    }

    Ok(())
}

fn is_page(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PAGE_EXTENSION))
}

fn discovered(
    root: &Path,
    original_path: &Path,
    absolute_path: PathBuf,
) -> DiscoveredFile {
    DiscoveredFile {
        relative_path: original_path
            .strip_prefix(root)
            .unwrap_or(original_path)
            .to_path_buf(),
        absolute_path,
    }
}
