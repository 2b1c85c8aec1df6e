//! Markup adapter: one query/attribute/text capability over two backends.
//!
//! The static backend wraps an offline `scraper::Html` parse tree; the live
//! backend wraps elements of a rendered chromiumoxide page. Extraction and
//! field resolution depend only on [`DomNode`], never on backend identity.
//!
//! Queries are total: a malformed or unsupported selector yields an empty
//! result, never an error.

use std::sync::Arc;

use chromiumoxide::{Element, Page};
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

/// Handle to one element in either backend.
#[derive(Clone)]
pub enum DomNode {
    Static(StaticNode),
    Live(LiveNode),
}

impl DomNode {
    /// Descendant elements of this node matching the selector list.
    pub async fn query(&self, selectors: &str) -> Vec<DomNode> {
        match self {
            DomNode::Static(node) => node.query(selectors),
            DomNode::Live(node) => node.query(selectors).await,
        }
    }

    /// An attribute value, absent when the attribute is missing.
    pub async fn attribute(&self, name: &str) -> Option<String> {
        match self {
            DomNode::Static(node) => node.attribute(name),
            DomNode::Live(node) => node.attribute(name).await,
        }
    }

    /// Visible text, whitespace-normalized.
    pub async fn text(&self) -> String {
        match self {
            DomNode::Static(node) => node.text(),
            DomNode::Live(node) => node.text().await,
        }
    }

    /// Whether any descendant matches the selector list.
    pub async fn matches_any(&self, selectors: &str) -> bool {
        !self.query(selectors).await.is_empty()
    }
}

// ---------- static backend ----------

/// Offline parse tree backend.
#[derive(Clone)]
pub struct StaticDocument {
    html: Arc<Html>,
}

impl StaticDocument {
    pub fn parse(text: &str) -> Self {
        Self {
            html: Arc::new(Html::parse_document(text)),
        }
    }

    /// Parse a markup snippet, e.g. an `outerHTML` capture of a rendered
    /// container.
    pub fn parse_fragment(text: &str) -> Self {
        Self {
            html: Arc::new(Html::parse_fragment(text)),
        }
    }

    pub fn query(&self, selectors: &str) -> Vec<DomNode> {
        let Ok(selector) = Selector::parse(selectors) else {
            return Vec::new();
        };
        self.html
            .select(&selector)
            .map(|el| self.node(el.id()))
            .collect()
    }

    /// The top element of a parsed fragment (the fragment root's first
    /// element child).
    pub fn fragment_root(&self) -> Option<DomNode> {
        self.html
            .root_element()
            .child_elements()
            .next()
            .map(|el| self.node(el.id()))
    }

    fn node(&self, id: NodeId) -> DomNode {
        DomNode::Static(StaticNode {
            html: Arc::clone(&self.html),
            id,
        })
    }
}

/// Element handle in the static backend: the shared tree plus a node id.
#[derive(Clone)]
pub struct StaticNode {
    html: Arc<Html>,
    id: NodeId,
}

impl StaticNode {
    fn element(&self) -> Option<ElementRef<'_>> {
        self.html.tree.get(self.id).and_then(ElementRef::wrap)
    }

    pub fn query(&self, selectors: &str) -> Vec<DomNode> {
        let Ok(selector) = Selector::parse(selectors) else {
            return Vec::new();
        };
        let Some(element) = self.element() else {
            return Vec::new();
        };
        element
            .select(&selector)
            .map(|el| {
                DomNode::Static(StaticNode {
                    html: Arc::clone(&self.html),
                    id: el.id(),
                })
            })
            .collect()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.element()
            .and_then(|el| el.value().attr(name))
            .map(|v| v.to_string())
    }

    pub fn text(&self) -> String {
        let Some(element) = self.element() else {
            return String::new();
        };
        let raw: Vec<&str> = element.text().collect();
        normalize_whitespace(&raw.join(" "))
    }

    /// Element ancestors, nearest first. Used by anchor recovery.
    pub fn ancestor_elements(&self) -> Vec<StaticNode> {
        let mut out = Vec::new();
        let Some(node) = self.html.tree.get(self.id) else {
            return out;
        };
        let mut current = node.parent();
        while let Some(parent) = current {
            if ElementRef::wrap(parent).is_some() {
                out.push(StaticNode {
                    html: Arc::clone(&self.html),
                    id: parent.id(),
                });
            }
            current = parent.parent();
        }
        out
    }
}

// ---------- live backend ----------

/// Rendered-document backend over a live chromiumoxide page.
#[derive(Clone)]
pub struct LivePage {
    page: Page,
}

impl LivePage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub async fn query(&self, selectors: &str) -> Vec<DomNode> {
        match self.page.find_elements(selectors).await {
            Ok(elements) => elements.into_iter().map(LiveNode::wrap).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Element handle in the live backend.
#[derive(Clone)]
pub struct LiveNode {
    element: Arc<Element>,
}

impl LiveNode {
    fn wrap(element: Element) -> DomNode {
        DomNode::Live(Self {
            element: Arc::new(element),
        })
    }

    pub async fn query(&self, selectors: &str) -> Vec<DomNode> {
        match self.element.find_elements(selectors).await {
            Ok(elements) => elements.into_iter().map(LiveNode::wrap).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub async fn attribute(&self, name: &str) -> Option<String> {
        self.element.attribute(name).await.ok().flatten()
    }

    pub async fn text(&self) -> String {
        match self.element.inner_text().await {
            Ok(Some(text)) => normalize_whitespace(&text),
            _ => String::new(),
        }
    }

    /// Run a JS function (`function() { ... }`) against this element and
    /// deserialize its return value. Errors collapse to `None`; DOM reads
    /// must stay side-effect-free for callers.
    pub async fn eval_js<T: serde::de::DeserializeOwned>(&self, function: &str) -> Option<T> {
        let returns = self.element.call_js_fn(function, false).await.ok()?;
        let value = returns.result.value?;
        serde_json::from_value(value).ok()
    }
}

pub(crate) fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for token in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}
