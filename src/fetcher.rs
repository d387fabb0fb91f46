//! Page fetching and JSON extraction.
//!
//! A [`ContentFetcher`] returns a page body that is expected to hold a JSON
//! payload, either as the raw body or wrapped in a rendered `<pre>` block (the
//! way a browser displays a JSON document). [`FetchedPage::parse_json`] tries
//! each [`ParseStrategy`] in order and the first success wins.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, COOKIE};
use scraper::{Html, Selector};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::constants::BROWSER_USER_AGENT;
use crate::error::ScrapeError;
use crate::session::SessionState;

/// Parse strategies, tried in sequence.
pub const PARSE_STRATEGIES: &[ParseStrategy] =
    &[ParseStrategy::RawBody, ParseStrategy::RenderedPre];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// The body is the JSON text itself.
    RawBody,
    /// The body is a rendered HTML page with the JSON inside the first `<pre>`.
    RenderedPre,
}

impl ParseStrategy {
    fn extract(self, body: &str) -> Option<Cow<'_, str>> {
        match self {
            Self::RawBody => Some(Cow::Borrowed(body)),
            Self::RenderedPre => {
                let document = Html::parse_document(body);
                let pre = Selector::parse("pre").expect("Invalid selector");
                document
                    .select(&pre)
                    .next()
                    .map(|el| Cow::Owned(el.text().collect::<String>()))
            }
        }
    }
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawBody => f.write_str("raw body"),
            Self::RenderedPre => f.write_str("rendered <pre>"),
        }
    }
}

/// A fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub body: String,
}

impl FetchedPage {
    #[must_use]
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }

    /// Decode the page's JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Parse`] listing every strategy's failure if none succeeds.
    pub fn parse_json<T: DeserializeOwned>(&self) -> Result<T, ScrapeError> {
        let mut failures = Vec::new();

        for strategy in PARSE_STRATEGIES {
            let Some(text) = strategy.extract(&self.body) else {
                failures.push(format!("{strategy}: not found"));
                continue;
            };
            match serde_json::from_str::<T>(text.trim()) {
                Ok(value) => {
                    if failures.is_empty() {
                        trace!(url = %self.url, %strategy, "Parsed JSON payload");
                    } else {
                        debug!(url = %self.url, %strategy, "Parsed JSON payload with fallback strategy");
                    }
                    return Ok(value);
                }
                Err(e) => failures.push(format!("{strategy}: {e}")),
            }
        }

        Err(ScrapeError::Parse {
            url: self.url.clone(),
            reason: failures.join("; "),
        })
    }
}

/// Transport boundary for retrieving forum pages.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the page at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout or a non-success status.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// HTTP fetcher that replays the persisted session's cookies.
pub struct HttpFetcher {
    client: reqwest::Client,
    session: SessionState,
}

impl HttpFetcher {
    /// Build a fetcher whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(session: &SessionState, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            session: session.clone(),
        })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(cookie) = self.session.cookie_header(url) {
            request = request.header(COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("Fetch of {url} failed with status {}", response.status());
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {url}"))?;

        Ok(FetchedPage::new(url, body))
    }
}
