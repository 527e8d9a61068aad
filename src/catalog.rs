//! Content sources feeding the index build.

use crate::{document::ComponentVersion, error::Result};

/// Where a page came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSource {
    pub component: String,
    pub version: String,
    /// File name without extension, used as the document name.
    pub stem: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    /// Whether the page is part of the published output.
    pub out: bool,
    /// Page-level no-index directive.
    pub noindex: bool,
    pub src: PageSource,
    /// Published URL, relative to the site root.
    pub url: String,
}

/// A rendered page and its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub meta: PageMeta,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub title: String,
    pub latest_version: String,
    pub versions: Vec<ComponentVersion>,
}

/// Supplies pages and component metadata to the index build.
pub trait ContentSource {
    /// Pages accepted by `predicate`, in catalog order.
    ///
    /// Implementations that read page contents lazily must only read the
    /// pages the predicate accepts.
    fn pages(&self, predicate: &dyn Fn(&PageMeta) -> bool)
    -> Result<Vec<Page>>;

    fn components(&self) -> Vec<Component>;

    fn component_version(
        &self,
        component: &str,
        version: &str,
    ) -> Option<ComponentVersion> {
        self.components()
            .into_iter()
            .find(|c| c.name == component)?
            .versions
            .into_iter()
            .find(|v| v.version == version)
    }
}

/// In-memory content source.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pages: Vec<Page>,
    components: Vec<Component>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component. The first version listed is the latest.
    pub fn add_component(
        &mut self,
        name: &str,
        title: &str,
        versions: &[&str],
    ) -> &mut Self {
        let versions: Vec<ComponentVersion> = versions
            .iter()
            .map(|v| ComponentVersion {
                name: name.to_string(),
                title: title.to_string(),
                display_version: v.to_string(),
                version: v.to_string(),
            })
            .collect();
        self.components.push(Component {
            name: name.to_string(),
            title: title.to_string(),
            latest_version: versions
                .first()
                .map(|v| v.version.clone())
                .unwrap_or_default(),
            versions,
        });
        self
    }

    /// Append a published page rendered from `html`.
    pub fn add_page(
        &mut self,
        component: &str,
        version: &str,
        stem: &str,
        html: &str,
    ) -> &mut Self {
        self.push(Page {
            meta: PageMeta {
                out: true,
                noindex: false,
                src: PageSource {
                    component: component.to_string(),
                    version: version.to_string(),
                    stem: stem.to_string(),
                },
                url: format!("/{component}/{version}/{stem}.html"),
            },
            contents: html.to_string(),
        })
    }

    pub fn push(&mut self, page: Page) -> &mut Self {
        self.pages.push(page);
        self
    }
}

impl ContentSource for Catalog {
    fn pages(
        &self,
        predicate: &dyn Fn(&PageMeta) -> bool,
    ) -> Result<Vec<Page>> {
        Ok(self
            .pages
            .iter()
            .filter(|p| predicate(&p.meta))
            .cloned()
            .collect())
    }

    fn components(&self) -> Vec<Component> {
        self.components.clone()
    }
}
