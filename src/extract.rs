//! Turns one rendered page into an indexable [`Document`].
//!
//! Extraction is best-effort: malformed markup still yields a document, and
//! a page without an article region falls back to its `<body>`.

use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use crate::{
    catalog::Page,
    document::{Document, SubTitle},
};

/// Candidate containers for the page content, most specific first.
const ARTICLE_SELECTORS: &[&str] = &["article.doc", "article", "main", "body"];

/// Elements dropped with their whole subtree.
const SKIPPED_ELEMENTS: &[&str] =
    &["nav", "script", "style", "noscript", "template"];

const SKIPPED_CLASSES: &[&str] = &["pagination"];

const SUB_HEADINGS: &[&str] = &["h2", "h3", "h4", "h5", "h6"];

/// Elements whose boundaries separate words even without whitespace.
const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "blockquote",
    "br",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "h1",
    "hr",
    "li",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "td",
    "th",
    "tr",
    "ul",
];

/// Extract the document for `page`, or `None` if the page must not be
/// indexed.
pub fn extract(page: &Page, id: u32) -> Option<Document> {
    if !page.meta.out {
        debug!(url = %page.meta.url, "skipping page outside published output");
        return None;
    }
    if page.meta.noindex {
        debug!(url = %page.meta.url, "skipping page flagged noindex");
        return None;
    }

    let html = Html::parse_document(&page.contents);
    if has_robots_noindex(&html) {
        debug!(url = %page.meta.url, "skipping page with robots noindex");
        return None;
    }

    let title = first_match(&html, &["h1.page", "h1"]);
    let article = first_match(&html, ARTICLE_SELECTORS)
        .unwrap_or_else(|| html.root_element());

    let mut walker = BodyWalker {
        title,
        text: String::new(),
        titles: Vec::new(),
    };
    walker.walk(article);

    Some(Document {
        id,
        title: title.map(element_text).unwrap_or_default(),
        text: collapse(&walker.text),
        component: page.meta.src.component.clone(),
        version: page.meta.src.version.clone(),
        name: page.meta.src.stem.clone(),
        url: page.meta.url.clone(),
        titles: walker.titles,
    })
}

fn has_robots_noindex(html: &Html) -> bool {
    let Ok(selector) = Selector::parse(r#"meta[name="robots"]"#) else {
        return false;
    };
    html.select(&selector).any(|meta| {
        meta.value()
            .attr("content")
            .is_some_and(|c| c.to_lowercase().contains("noindex"))
    })
}

fn first_match<'a>(
    html: &'a Html,
    selectors: &[&str],
) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        html.select(&selector).next()
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse(&element.text().collect::<String>())
}

/// Collapse whitespace runs to single spaces and trim.
fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct BodyWalker<'a> {
    title: Option<ElementRef<'a>>,
    text: String,
    titles: Vec<SubTitle>,
}

impl<'a> BodyWalker<'a> {
    fn walk(&mut self, element: ElementRef<'a>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.text.push_str(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.visit(child);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit(&mut self, element: ElementRef<'a>) {
        let value = element.value();
        let name = value.name();

        if Some(element) == self.title
            || SKIPPED_ELEMENTS.contains(&name)
            || value.classes().any(|c| SKIPPED_CLASSES.contains(&c))
        {
            return;
        }

        if SUB_HEADINGS.contains(&name) {
            self.titles.push(SubTitle {
                id: self.titles.len() as u32 + 1,
                text: element_text(element),
                hash: value.attr("id").unwrap_or_default().to_string(),
            });
            self.text.push(' ');
            return;
        }

        let block = BLOCK_ELEMENTS.contains(&name);
        if block {
            self.text.push(' ');
        }
        self.walk(element);
        if block {
            self.text.push(' ');
        }
    }
}
