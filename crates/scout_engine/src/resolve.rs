//! Ordered-fallback field resolution over candidate nodes.

use scout_core::{SelectorCatalog, SelectorField};

use crate::markup::DomNode;

/// Resolves semantic fields by walking a field's strategy list in order and
/// taking the first non-empty value.
pub struct FieldResolver<'a> {
    catalog: &'a SelectorCatalog,
}

impl<'a> FieldResolver<'a> {
    pub fn new(catalog: &'a SelectorCatalog) -> Self {
        Self { catalog }
    }

    /// First non-empty text for the field, empty string when every strategy
    /// misses.
    ///
    /// A `title` attribute on the matched node wins over visible text;
    /// attributes survive the ellipsis truncation listing cards apply.
    pub async fn text(&self, node: &DomNode, field: SelectorField) -> String {
        for selector in self.catalog.strategies(field) {
            if let Some(value) = first_value(node, selector).await {
                return value;
            }
        }
        String::new()
    }

    /// Integer field: per strategy, strip every non-digit from the resolved
    /// text and parse. Text with no digits counts as unresolved and the
    /// walk continues; full exhaustion yields 0.
    pub async fn amount(&self, node: &DomNode, field: SelectorField) -> u64 {
        for selector in self.catalog.strategies(field) {
            if let Some(value) = first_value(node, selector).await {
                let digits: String = value.chars().filter(char::is_ascii_digit).collect();
                if let Ok(amount) = digits.parse::<u64>() {
                    return amount;
                }
            }
        }
        0
    }

    /// Rating: leading whitespace-delimited token of the resolved text,
    /// parsed as a float. Anything unparseable is 0.0.
    pub async fn rating(&self, node: &DomNode) -> f32 {
        let text = self.text(node, SelectorField::Rating).await;
        text.split_whitespace()
            .next()
            .and_then(|token| token.parse::<f32>().ok())
            .unwrap_or(0.0)
    }
}

/// First strategy match under `node`, preferring its `title` attribute over
/// visible text. `None` when there is no match or both sources are blank.
async fn first_value(node: &DomNode, selector: &str) -> Option<String> {
    let matches = node.query(selector).await;
    let first = matches.first()?;
    if let Some(attr) = first.attribute("title").await {
        let attr = attr.trim();
        if !attr.is_empty() {
            return Some(attr.to_string());
        }
    }
    let text = first.text().await;
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
