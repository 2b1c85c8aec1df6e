//! Headless-browser rendering tier support.
//!
//! One session is provisioned lazily on the first page that needs a
//! rendered tier and reused for the rest of the run; Chrome tabs do not
//! tolerate concurrent navigations, which is why pages are scraped
//! strictly sequentially.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};

use scout_logging::{scout_debug, scout_warn};

use crate::markup::{LiveNode, LivePage};
use crate::types::RenderError;

/// Tunables for the rendered tiers.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub headless: bool,
    pub user_agent: String,
    pub nav_timeout_ms: u64,
    /// Bounded scroll-to-bottom cycles to trigger lazy loading.
    pub scroll_attempts: u32,
    /// Settle time between scroll cycles.
    pub scroll_settle_ms: u64,
    /// Poll interval while waiting for container nodes.
    pub wait_poll_ms: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: crate::fetch::USER_AGENTS[0].to_string(),
            nav_timeout_ms: 12_000,
            scroll_attempts: 4,
            scroll_settle_ms: 500,
            wait_poll_ms: 250,
        }
    }
}

/// A live Chrome session plus the event-handler task that drives it.
pub struct RenderingSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Option<LivePage>,
    settings: RenderSettings,
}

impl RenderingSession {
    /// Launch a browser with the anti-automation profile.
    pub async fn launch(settings: RenderSettings) -> Result<Self, RenderError> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-extensions")
            .arg("--disable-gpu")
            .arg("--window-size=1920,1080")
            .arg(format!("--user-agent={}", settings.user_agent));
        if settings.headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(RenderError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        // The handler stream must be pumped for the session to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser,
            handler_task,
            page: None,
            settings,
        })
    }

    /// Navigate the session's (single, reused) tab to `url`.
    pub async fn open(&mut self, url: &str) -> Result<LivePage, RenderError> {
        if self.page.is_none() {
            let page = self
                .browser
                .new_page("about:blank")
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))?;
            self.page = Some(LivePage::new(page));
        }
        // Borrow checked above.
        let live = self.page.clone().ok_or_else(|| {
            RenderError::Navigation("page handle lost".to_string())
        })?;

        let nav = timeout(
            Duration::from_millis(self.settings.nav_timeout_ms),
            live.page().goto(url),
        )
        .await;
        match nav {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(RenderError::Navigation(e.to_string())),
            Err(_) => {
                return Err(RenderError::Timeout(
                    self.settings.nav_timeout_ms,
                    "navigation".to_string(),
                ))
            }
        }
        let _ = live.page().wait_for_navigation().await;

        // Mask the automation marker the way stealth profiles do.
        let _ = live
            .page()
            .evaluate("Object.defineProperty(navigator, 'webdriver', {get: () => undefined})")
            .await;

        Ok(live)
    }

    /// Wait until at least one node matches `selector`, bounded by
    /// `timeout_ms`. Returns false on expiry.
    pub async fn wait_for_nodes(
        &self,
        page: &LivePage,
        selector: &str,
        timeout_ms: u64,
    ) -> bool {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if !page.query(selector).await.is_empty() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_millis(self.settings.wait_poll_ms)).await;
        }
    }

    /// Incremental scroll-to-bottom cycles until the document height
    /// stabilizes (and no loading indicator remains) or the attempt cap is
    /// reached.
    pub async fn scroll_to_stable(&self, page: &LivePage, loading_selector: &str) {
        let mut last_height = document_height(page).await;
        for _ in 0..self.settings.scroll_attempts {
            let _ = page
                .page()
                .evaluate("window.scrollTo(0, document.body.scrollHeight);")
                .await;
            sleep(Duration::from_millis(self.settings.scroll_settle_ms)).await;

            let new_height = document_height(page).await;
            if new_height == last_height
                && (loading_selector.is_empty() || page.query(loading_selector).await.is_empty())
            {
                break;
            }
            last_height = new_height;
        }
    }

    /// Ancestor climb for the live backend.
    ///
    /// chromiumoxide exposes no parent-element handles, so the walk runs
    /// in-page: up to `depth` ancestors of the anchor, stopping at the
    /// first one containing a `predicate_selector` match, defaulting to the
    /// immediate parent. Returns the chosen container's rendered
    /// `outerHTML` for fragment extraction.
    pub async fn climb_to_container(
        &self,
        anchor: &LiveNode,
        predicate_selector: &str,
        depth: usize,
    ) -> Option<String> {
        let selector_js = match serde_json::to_string(predicate_selector) {
            Ok(js) => js,
            Err(_) => return None,
        };
        let function = format!(
            "function() {{\
               const sel = {selector_js};\
               let node = this.parentElement;\
               let chosen = null;\
               for (let i = 0; i < {depth} && node; i++) {{\
                 if (sel && node.querySelector(sel)) {{ chosen = node; break; }}\
                 node = node.parentElement;\
               }}\
               if (!chosen) chosen = this.parentElement;\
               return chosen ? chosen.outerHTML : null;\
             }}"
        );
        anchor.eval_js::<Option<String>>(&function).await.flatten()
    }

    /// Release the browser. Safe to call once; drop also cleans up the
    /// handler task.
    pub async fn close(mut self) {
        if let Some(live) = self.page.take() {
            if let Err(e) = live.page().clone().close().await {
                scout_debug!("page close failed: {e}");
            }
        }
        if let Err(e) = self.browser.close().await {
            scout_warn!("browser close failed: {e}");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}

async fn document_height(page: &LivePage) -> i64 {
    match page.page().evaluate("document.body.scrollHeight").await {
        Ok(result) => result.into_value().unwrap_or(0),
        Err(_) => 0,
    }
}
