//! Candidate node to `ProductRecord` assembly.

use chrono::Utc;
use sha2::{Digest, Sha256};
use url::Url;

use scout_core::{discount_percent, ProductRecord, SelectorCatalog, SelectorField};

use crate::markup::DomNode;
use crate::resolve::FieldResolver;

/// Attributes that carry an explicit listing identifier.
const ID_ATTRIBUTES: [&str; 3] = ["data-id", "data-pid", "data-product-id"];
/// Query parameters product links encode the identifier in.
const ID_QUERY_PARAMS: [&str; 3] = ["pid", "product_id", "p"];
/// Low-resolution thumbnail path segment and its upgrade.
const THUMB_SEGMENT: (&str, &str) = ("200/200", "400/400");

/// Assembles candidate nodes into product records.
///
/// Extraction is tolerant: every field except identifier and title may be
/// missing. The validity gate (price > 0) is applied by the caller so that
/// partially assembled records can still be counted.
pub struct ProductExtractor {
    catalog: SelectorCatalog,
    base: Url,
}

impl ProductExtractor {
    pub fn new(catalog: SelectorCatalog, base: Url) -> Self {
        Self { catalog, base }
    }

    pub fn catalog(&self) -> &SelectorCatalog {
        &self.catalog
    }

    /// Assemble a record from a candidate node.
    ///
    /// `link_hint` is the anchor href that led to this candidate during
    /// anchor recovery; it is consulted only when the node itself exposes
    /// no product link. Returns `None` when neither an identifier nor a
    /// title can be recovered.
    pub async fn extract(
        &self,
        node: &DomNode,
        page_number: u32,
        link_hint: Option<&str>,
    ) -> Option<ProductRecord> {
        let resolver = FieldResolver::new(&self.catalog);
        let link_selector = self.catalog.combined(SelectorField::Link);

        let href = match first_attribute(node, &link_selector, "href").await {
            Some(raw) => Some(self.absolutize(&raw)),
            None => link_hint.map(|raw| self.absolutize(raw)),
        };

        let identifier = self.recover_identifier(node, href.as_deref()).await?;

        let mut title = resolver.text(node, SelectorField::Title).await;
        if title.is_empty() {
            title = first_anchor_text(node).await;
        }
        if title.is_empty() {
            return None;
        }

        let brand = resolver.text(node, SelectorField::Brand).await;
        let rating_score = resolver.rating(node).await;
        let rating_count = resolver.amount(node, SelectorField::RatingCount).await;

        let price = resolver.amount(node, SelectorField::CurrentPrice).await;
        let mut original_price = resolver.amount(node, SelectorField::OriginalPrice).await;
        if original_price == 0 {
            // No strike-through price shown; no discount implied.
            original_price = price;
        }

        let out_of_stock = self.catalog.combined(SelectorField::OutOfStock);
        let in_stock = !node.matches_any(&out_of_stock).await;

        let image_url = self.recover_image(node).await;
        let product_url = href.unwrap_or_default();

        Some(ProductRecord {
            identifier,
            title,
            brand,
            price,
            original_price,
            discount_percent: discount_percent(price, original_price),
            rating_score,
            rating_count,
            in_stock,
            image_url,
            product_url,
            page_number,
            captured_at: Utc::now().to_rfc3339(),
        })
    }

    /// Identifier recovery ladder: explicit attribute, link query parameter,
    /// link path segment, href hash, first-anchor-text hash.
    async fn recover_identifier(&self, node: &DomNode, href: Option<&str>) -> Option<String> {
        for attr in ID_ATTRIBUTES {
            if let Some(value) = node.attribute(attr).await {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }

        if let Some(href) = href {
            if let Some(id) = identifier_from_link(href) {
                return Some(id);
            }
            return Some(stable_hash("href", href));
        }

        let anchor_text = first_anchor_text(node).await;
        if anchor_text.is_empty() {
            None
        } else {
            Some(stable_hash("text", &anchor_text))
        }
    }

    async fn recover_image(&self, node: &DomNode) -> String {
        for selector in self.catalog.strategies(SelectorField::Image) {
            let matches = node.query(selector).await;
            let Some(image) = matches.first() else {
                continue;
            };
            let src = match image.attribute("src").await.filter(|s| !s.is_empty()) {
                Some(src) => Some(src),
                // Lazily-loaded images park the real URL in data-src.
                None => image.attribute("data-src").await.filter(|s| !s.is_empty()),
            };
            if let Some(src) = src {
                return src.replace(THUMB_SEGMENT.0, THUMB_SEGMENT.1);
            }
        }
        String::new()
    }

    /// Expand a site-relative href against the configured origin.
    pub fn absolutize(&self, href: &str) -> String {
        let href = href.trim();
        if href.is_empty() || href.starts_with("http://") || href.starts_with("https://") {
            return href.to_string();
        }
        match self.base.join(href) {
            Ok(url) => url.into(),
            Err(_) => href.to_string(),
        }
    }
}

/// Identifier from a product link: `pid`-style query parameter first, then
/// the path segment following `/p/`.
fn identifier_from_link(href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    for (key, value) in url.query_pairs() {
        if ID_QUERY_PARAMS.contains(&key.as_ref()) && !value.is_empty() {
            return Some(value.into_owned());
        }
    }
    let mut segments = url.path_segments()?;
    while let Some(segment) = segments.next() {
        if segment == "p" {
            return segments.next().filter(|s| !s.is_empty()).map(str::to_string);
        }
    }
    None
}

/// Deterministic identifier fallback: `<kind>-<first 12 hex of sha256>`.
fn stable_hash(kind: &str, input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(12);
    for byte in digest.iter().take(6) {
        hex.push_str(&format!("{byte:02x}"));
    }
    format!("{kind}-{hex}")
}

async fn first_attribute(node: &DomNode, selector: &str, name: &str) -> Option<String> {
    let matches = node.query(selector).await;
    let first = matches.first()?;
    first.attribute(name).await.filter(|v| !v.trim().is_empty())
}

async fn first_anchor_text(node: &DomNode) -> String {
    let anchors = node.query("a").await;
    match anchors.first() {
        Some(anchor) => anchor.text().await.trim().to_string(),
        None => String::new(),
    }
}
