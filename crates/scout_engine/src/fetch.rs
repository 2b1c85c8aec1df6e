use std::time::Duration;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, USER_AGENT};

use crate::types::{FailureKind, FetchError};

/// Desktop browser identities rotated across requests.
pub const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
];

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub user_agents: Vec<String>,
    /// Opaque authenticated-session token, sent verbatim as the Cookie header.
    pub auth_cookie: Option<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(12),
            redirect_limit: 5,
            user_agents: USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
            auth_cookie: None,
        }
    }
}

/// Source of static listing markup. The chain depends on this seam so page
/// tiers can be exercised without a network.
#[async_trait::async_trait]
pub trait ListingFetcher: Send + Sync {
    async fn fetch_listing(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher with identity rotation and charset-sniffed decode.
#[derive(Debug)]
pub struct HttpListingFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl HttpListingFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        if let Some(cookie) = settings.auth_cookie.as_deref() {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| FetchError::new(FailureKind::InvalidUrl, e.to_string()))?;
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::new(FailureKind::Network, e.to_string()))?;

        Ok(Self { settings, client })
    }

    fn pick_user_agent(&self) -> &str {
        if self.settings.user_agents.is_empty() {
            return USER_AGENTS[0];
        }
        let idx = fastrand::usize(..self.settings.user_agents.len());
        &self.settings.user_agents[idx]
    }
}

#[async_trait::async_trait]
impl ListingFetcher for HttpListingFetcher {
    async fn fetch_listing(&self, url: &str) -> Result<String, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| FetchError::new(FailureKind::InvalidUrl, e.to_string()))?;

        let response = self
            .client
            .get(parsed)
            .header(USER_AGENT, self.pick_user_agent())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(decode_listing(&bytes, content_type.as_deref()))
    }
}

/// Decode response bytes: BOM -> Content-Type charset -> chardetng guess.
///
/// Decoding is lossy on purpose; a few replacement characters in ad markup
/// must not cost the page.
pub fn decode_listing(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = Encoding::for_bom(bytes)
        .map(|(enc, _)| enc)
        .or_else(|| {
            content_type
                .and_then(extract_charset)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

fn extract_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').find_map(|part| {
        let part = part.trim();
        if part.len() >= 8 && part[..8].eq_ignore_ascii_case("charset=") {
            Some(part[8..].trim_matches([' ', '"', '\''].as_ref()))
        } else {
            None
        }
    })
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
