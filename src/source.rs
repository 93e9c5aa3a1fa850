use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use tracing::{debug, warn};

use crate::config::ScrapeConfig;
use crate::http_client::http_client;
use crate::page_cache::{CachedPage, PageCache};

/// A retrieved page. The status is carried through for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub body: String,
    pub from_cache: bool,
}

impl FetchedPage {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Where season pages come from.
///
/// A non-200 status is not an error: the body is still handed back and
/// parsed. Only transport failures are `Err`.
pub trait PageSource {
    fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

pub struct HttpPageSource {
    client: &'static Client,
    cache: Option<PageCache>,
}

impl HttpPageSource {
    pub fn new(timeout: Duration, user_agent: &str, cache: Option<PageCache>) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout, user_agent)?,
            cache,
        })
    }

    pub fn from_config(config: &ScrapeConfig) -> Result<Self> {
        let cache = if config.use_cache {
            PageCache::open_default()
        } else {
            None
        };
        Self::new(config.timeout, &config.user_agent, cache)
    }
}

impl PageSource for HttpPageSource {
    fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let cached = match &self.cache {
            Some(cache) => cache.lookup(url)?,
            None => None,
        };

        let mut req = self.client.get(url);
        if let Some(entry) = cached.as_ref() {
            if let Some(etag) = entry.etag.as_ref() {
                req = req.header(IF_NONE_MATCH, etag);
            }
            if let Some(last_modified) = entry.last_modified.as_ref() {
                req = req.header(IF_MODIFIED_SINCE, last_modified);
            }
        }

        let resp = req
            .send()
            .with_context(|| format!("request failed: {url}"))?;
        let status = resp.status();
        let headers = resp.headers().clone();

        if status == StatusCode::NOT_MODIFIED {
            let entry = cached.ok_or_else(|| anyhow!("received 304 without cache body: {url}"))?;
            debug!(url, "page not modified, serving cached body");
            return Ok(FetchedPage {
                url: url.to_string(),
                status: StatusCode::OK.as_u16(),
                body: entry.body,
                from_cache: true,
            });
        }

        let body = resp
            .text()
            .with_context(|| format!("failed reading body: {url}"))?;
        if status != StatusCode::OK {
            warn!(url, status = status.as_u16(), "unexpected status, parsing body anyway");
        } else if let Some(cache) = &self.cache {
            let header_text = |name: HeaderName| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.to_string())
            };
            let page = CachedPage::new(body.clone(), header_text(ETAG), header_text(LAST_MODIFIED));
            if page.has_validators()
                && let Err(err) = cache.store(url, page)
            {
                warn!(url, "page cache write failed: {err:#}");
            }
        }

        Ok(FetchedPage {
            url: url.to_string(),
            status: status.as_u16(),
            body,
            from_cache: false,
        })
    }
}

/// Pages held in memory, keyed by exact URL. Unknown URLs come back as 404
/// with an empty body.
#[derive(Debug, Clone, Default)]
pub struct StaticPageSource {
    pages: HashMap<String, (u16, String)>,
}

impl StaticPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.insert(url, 200, body);
        self
    }

    pub fn insert(&mut self, url: &str, status: u16, body: impl Into<String>) {
        self.pages.insert(url.to_string(), (status, body.into()));
    }
}

impl PageSource for StaticPageSource {
    fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let (status, body) = self
            .pages
            .get(url)
            .cloned()
            .unwrap_or((404, String::new()));
        Ok(FetchedPage {
            url: url.to_string(),
            status,
            body,
            from_cache: false,
        })
    }
}
