use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One in-page heading (H2 to H6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTitle {
    /// 1-based, restarts for every document.
    pub id: u32,
    pub text: String,
    /// Anchor identifier of the heading, without `#`.
    pub hash: String,
}

/// Indexable content and metadata extracted from one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: u32,
    pub title: String,
    pub text: String,
    pub component: String,
    pub version: String,
    pub name: String,
    pub url: String,
    pub titles: Vec<SubTitle>,
}

impl Document {
    /// Names accepted by [`Document::field`].
    pub const FIELD_NAMES: [&'static str; 6] =
        ["title", "text", "component", "version", "name", "url"];

    /// Value of a named document field, as used by facet filters.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(&self.title),
            "text" => Some(&self.text),
            "component" => Some(&self.component),
            "version" => Some(&self.version),
            "name" => Some(&self.name),
            "url" => Some(&self.url),
            _ => None,
        }
    }

    pub fn sub_title(&self, id: u32) -> Option<&SubTitle> {
        self.titles.iter().find(|t| t.id == id)
    }
}

pub fn component_version_key(component: &str, version: &str) -> String {
    format!("{component}/{version}")
}

/// Identifier of an index record.
///
/// Rendered as `"{doc}"` for a full document and `"{doc}-{title}"` for a
/// heading-only record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ref {
    Document(u32),
    Section { document: u32, title: u32 },
}

impl Ref {
    pub fn document_id(self) -> u32 {
        match self {
            Self::Document(id) | Self::Section { document: id, .. } => id,
        }
    }

    pub fn sub_title_id(self) -> Option<u32> {
        match self {
            Self::Document(_) => None,
            Self::Section { title, .. } => Some(title),
        }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document(id) => write!(f, "{id}"),
            Self::Section { document, title } => {
                write!(f, "{document}-{title}")
            }
        }
    }
}

impl FromStr for Ref {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::NotFound {
            kind: "ref",
            name: s.to_string(),
        };
        match s.split_once('-') {
            Some((doc, title)) => Ok(Self::Section {
                document: doc.parse().map_err(|_| invalid())?,
                title: title.parse().map_err(|_| invalid())?,
            }),
            None => Ok(Self::Document(s.parse().map_err(|_| invalid())?)),
        }
    }
}

/// Display metadata for one version of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentVersion {
    pub name: String,
    pub title: String,
    pub display_version: String,
    pub version: String,
}

/// Documents and component metadata published next to the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub documents: BTreeMap<u32, Document>,
    pub component_versions: BTreeMap<String, ComponentVersion>,
}

impl Store {
    pub fn document(&self, id: u32) -> Result<&Document> {
        self.documents.get(&id).ok_or_else(|| Error::NotFound {
            kind: "document",
            name: id.to_string(),
        })
    }

    pub fn component_version(
        &self,
        component: &str,
        version: &str,
    ) -> Option<&ComponentVersion> {
        self.component_versions
            .get(&component_version_key(component, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_display_and_parse() {
        assert_eq!(Ref::Document(3).to_string(), "3");
        let section = Ref::Section {
            document: 3,
            title: 2,
        };
        assert_eq!(section.to_string(), "3-2");
        assert_eq!("3-2".parse::<Ref>().unwrap(), section);
        assert_eq!("12".parse::<Ref>().unwrap(), Ref::Document(12));
    }

    #[test]
    fn ref_parse_rejects_garbage() {
        assert!("abc".parse::<Ref>().is_err());
        assert!("1-".parse::<Ref>().is_err());
        assert!("-1".parse::<Ref>().is_err());
    }

    #[test]
    fn ref_accessors() {
        let section = Ref::Section {
            document: 7,
            title: 1,
        };
        assert_eq!(section.document_id(), 7);
        assert_eq!(section.sub_title_id(), Some(1));
        assert_eq!(Ref::Document(7).sub_title_id(), None);
    }

    #[test]
    fn document_field_lookup() {
        let doc = Document {
            id: 1,
            title: "Intro".into(),
            text: "body".into(),
            component: "guide".into(),
            version: "2.0".into(),
            name: "intro".into(),
            url: "/guide/2.0/intro.html".into(),
            titles: vec![],
        };
        assert_eq!(doc.field("component"), Some("guide"));
        assert_eq!(doc.field("version"), Some("2.0"));
        assert_eq!(doc.field("unknown"), None);
    }

    #[test]
    fn store_serializes_with_camel_case_keys() {
        let mut store = Store::default();
        store.component_versions.insert(
            "guide/2.0".into(),
            ComponentVersion {
                name: "guide".into(),
                title: "Guide".into(),
                display_version: "2.0".into(),
                version: "2.0".into(),
            },
        );
        let json = serde_json::to_value(&store).unwrap();
        assert!(json.get("componentVersions").is_some());
        assert_eq!(
            json["componentVersions"]["guide/2.0"]["displayVersion"],
            "2.0"
        );
    }
}
