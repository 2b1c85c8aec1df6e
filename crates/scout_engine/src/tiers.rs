//! The escalating fetch-strategy chain.
//!
//! Four tiers per page, cheapest first: static fetch, static with anchor
//! recovery, rendered fetch, rendered with anchor recovery. A tier runs
//! only while the page's merged unique yield is below the configured
//! threshold, and every tier failure collapses to zero yield instead of
//! aborting the page.

use std::collections::HashSet;

use scout_core::{ProductRecord, SelectorField};
use scout_logging::{scout_debug, scout_info, scout_warn};

use crate::extract::ProductExtractor;
use crate::fetch::ListingFetcher;
use crate::markup::{DomNode, StaticDocument};
use crate::render::{RenderSettings, RenderingSession};
use crate::types::{PageYield, Tier};

/// Chain tunables. The climb depth and recovery predicate are heuristics
/// tuned against observed listing markup, not a contract; they are
/// configuration on purpose.
#[derive(Debug, Clone)]
pub struct ChainSettings {
    pub min_products_threshold: usize,
    /// Ancestor levels the anchor-recovery climb may take.
    pub climb_depth: usize,
    /// Bound for rendered-tier waits.
    pub page_timeout_ms: u64,
    /// `None` disables the rendered tiers entirely (no browser available).
    pub rendering: Option<RenderSettings>,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            min_products_threshold: 10,
            climb_depth: 5,
            page_timeout_ms: 12_000,
            rendering: Some(RenderSettings::default()),
        }
    }
}

enum RenderSlot {
    /// Not provisioned yet; rendering is lazy because most pages never
    /// need it.
    Idle,
    Ready(RenderingSession),
    /// Provisioning failed once; rendered tiers yield zero from then on.
    Failed,
}

/// Per-session strategy chain. Owns the (lazily provisioned) rendering
/// session and the static fetcher.
pub struct StrategyChain {
    fetcher: Box<dyn ListingFetcher>,
    extractor: ProductExtractor,
    settings: ChainSettings,
    renderer: RenderSlot,
}

impl StrategyChain {
    pub fn new(
        fetcher: Box<dyn ListingFetcher>,
        extractor: ProductExtractor,
        settings: ChainSettings,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            settings,
            renderer: RenderSlot::Idle,
        }
    }

    /// Run the tier ladder for one listing page.
    pub async fn scrape_page(&mut self, url: &str, page_number: u32) -> PageYield {
        let container = self.extractor.catalog().combined(SelectorField::Container);
        let link_selector = self.extractor.catalog().combined(SelectorField::Link);

        let mut page_yield = PageYield::default();
        let mut page_ids: HashSet<String> = HashSet::new();

        // Tier 1: static fetch through the container selector.
        let static_doc = match self.fetcher.fetch_listing(url).await {
            Ok(html) => Some(StaticDocument::parse(&html)),
            Err(e) => {
                scout_debug!("static fetch failed for page {page_number}: {e}");
                page_yield.soft_errors += 1;
                None
            }
        };
        if let Some(doc) = &static_doc {
            let candidates = doc.query(&container);
            for candidate in &candidates {
                if let Some(record) = self.extractor.extract(candidate, page_number, None).await {
                    admit_to_page(&mut page_yield, &mut page_ids, Tier::Static, record);
                }
            }
        }

        // Tier 2: same response, anchor recovery.
        if self.below_threshold(&page_yield) {
            if let Some(doc) = &static_doc {
                self.static_anchor_recovery(doc, &link_selector, page_number, &mut page_yield, &mut page_ids)
                    .await;
            }
        }

        // Tiers 3 and 4: rendered document.
        if self.below_threshold(&page_yield) {
            if let Some(live) = self.rendered_page(url, &container, &mut page_yield).await {
                let candidates = live.query(&container).await;
                for candidate in &candidates {
                    if let Some(record) = self.extractor.extract(candidate, page_number, None).await
                    {
                        admit_to_page(&mut page_yield, &mut page_ids, Tier::Rendered, record);
                    }
                }

                if self.below_threshold(&page_yield) {
                    self.rendered_anchor_recovery(
                        &live,
                        &link_selector,
                        page_number,
                        &mut page_yield,
                        &mut page_ids,
                    )
                    .await;
                }
            }
        }

        if let Some(tier) = page_yield.tier_used {
            scout_info!(
                "page {page_number}: {} unique records via {tier}",
                page_yield.records.len()
            );
        }
        page_yield
    }

    /// Release the rendering session, if one was ever provisioned.
    pub async fn teardown(&mut self) {
        if let RenderSlot::Ready(session) = std::mem::replace(&mut self.renderer, RenderSlot::Idle)
        {
            session.close().await;
        }
    }

    fn below_threshold(&self, page_yield: &PageYield) -> bool {
        page_yield.records.len() < self.settings.min_products_threshold
    }

    /// Selector list marking a node as listing-shaped: it shows a price,
    /// an image, or a title.
    fn recovery_predicate(&self) -> String {
        let catalog = self.extractor.catalog();
        [
            catalog.combined(SelectorField::CurrentPrice),
            catalog.combined(SelectorField::Image),
            catalog.combined(SelectorField::Title),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }

    async fn static_anchor_recovery(
        &self,
        doc: &StaticDocument,
        link_selector: &str,
        page_number: u32,
        page_yield: &mut PageYield,
        page_ids: &mut HashSet<String>,
    ) {
        let predicate = self.recovery_predicate();
        let mut seen_hrefs: HashSet<String> = HashSet::new();

        for anchor in doc.query(link_selector) {
            let Some(raw_href) = anchor.attribute("href").await else {
                continue;
            };
            let href = self.extractor.absolutize(&raw_href);
            if href.is_empty() || !seen_hrefs.insert(href.clone()) {
                continue;
            }

            let candidate = climb_static(&anchor, &predicate, self.settings.climb_depth)
                .await
                .unwrap_or_else(|| anchor.clone());
            if let Some(record) = self
                .extractor
                .extract(&candidate, page_number, Some(&href))
                .await
            {
                admit_to_page(page_yield, page_ids, Tier::StaticAnchor, record);
            }
        }
    }

    async fn rendered_anchor_recovery(
        &self,
        live: &crate::markup::LivePage,
        link_selector: &str,
        page_number: u32,
        page_yield: &mut PageYield,
        page_ids: &mut HashSet<String>,
    ) {
        let RenderSlot::Ready(session) = &self.renderer else {
            return;
        };
        let predicate = self.recovery_predicate();
        let mut seen_hrefs: HashSet<String> = HashSet::new();

        for anchor in live.query(link_selector).await {
            let Some(raw_href) = anchor.attribute("href").await else {
                continue;
            };
            let href = self.extractor.absolutize(&raw_href);
            if href.is_empty() || !seen_hrefs.insert(href.clone()) {
                continue;
            }
            let DomNode::Live(anchor_node) = &anchor else {
                continue;
            };

            // The climb resolves in-page and hands back the container's
            // rendered markup; extraction runs over the fragment.
            let Some(container_html) = session
                .climb_to_container(anchor_node, &predicate, self.settings.climb_depth)
                .await
            else {
                continue;
            };
            let fragment = StaticDocument::parse_fragment(&container_html);
            let Some(candidate) = fragment.fragment_root() else {
                continue;
            };
            if let Some(record) = self
                .extractor
                .extract(&candidate, page_number, Some(&href))
                .await
            {
                admit_to_page(page_yield, page_ids, Tier::RenderedAnchor, record);
            }
        }
    }

    /// Ensure the rendering session exists, navigate it, wait for
    /// containers and run the lazy-load scroll. Any failure is absorbed as
    /// zero rendered yield.
    async fn rendered_page(
        &mut self,
        url: &str,
        container: &str,
        page_yield: &mut PageYield,
    ) -> Option<crate::markup::LivePage> {
        if let RenderSlot::Idle = self.renderer {
            let Some(render_settings) = self.settings.rendering.clone() else {
                self.renderer = RenderSlot::Failed;
                return None;
            };
            match RenderingSession::launch(render_settings).await {
                Ok(session) => self.renderer = RenderSlot::Ready(session),
                Err(e) => {
                    scout_warn!("rendering session unavailable: {e}");
                    self.renderer = RenderSlot::Failed;
                    page_yield.soft_errors += 1;
                    return None;
                }
            }
        }
        let RenderSlot::Ready(session) = &mut self.renderer else {
            return None;
        };

        let loading = self
            .extractor
            .catalog()
            .combined(SelectorField::LoadingIndicator);

        match session.open(url).await {
            Ok(live) => {
                if !session
                    .wait_for_nodes(&live, container, self.settings.page_timeout_ms)
                    .await
                {
                    scout_debug!("no container nodes appeared within timeout at {url}");
                }
                session.scroll_to_stable(&live, &loading).await;
                Some(live)
            }
            Err(e) => {
                scout_debug!("rendered navigation failed: {e}");
                page_yield.soft_errors += 1;
                None
            }
        }
    }
}

/// Merge one assembled record into the page yield: validity gate, then
/// page-level identifier dedup. Records the deepest contributing tier.
fn admit_to_page(
    page_yield: &mut PageYield,
    page_ids: &mut HashSet<String>,
    tier: Tier,
    record: ProductRecord,
) {
    page_yield.found += 1;
    if !record.is_valid() {
        return;
    }
    if !page_ids.insert(record.identifier.clone()) {
        return;
    }
    page_yield.records.push(record);
    page_yield.tier_used = Some(tier);
}

/// Static-backend ancestor climb: nearest ancestors first, stop at the
/// first listing-shaped one, fall back to the immediate parent.
async fn climb_static(anchor: &DomNode, predicate: &str, depth: usize) -> Option<DomNode> {
    let DomNode::Static(node) = anchor else {
        return None;
    };
    let ancestors = node.ancestor_elements();
    for ancestor in ancestors.iter().take(depth) {
        let candidate = DomNode::Static(ancestor.clone());
        if candidate.matches_any(predicate).await {
            return Some(candidate);
        }
    }
    ancestors.first().cloned().map(DomNode::Static)
}
