//! Authenticated session lifecycle.
//!
//! The session is a browser storage-state document (cookies plus per-origin
//! storage) persisted to disk after an interactive login. On startup the
//! persisted state is loaded and probed against a JSON endpoint; a missing,
//! unreadable or rejected session triggers a fresh login.

pub mod browser;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ScrapeError;
use crate::fetcher::{ContentFetcher, HttpFetcher};

pub use browser::BrowserLogin;

/// Persisted credential bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub cookies: Vec<StoredCookie>,
    #[serde(default)]
    pub origins: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "root_path")]
    pub path: String,
    /// Unix seconds; `-1` or absent for session cookies.
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

fn root_path() -> String {
    "/".to_string()
}

impl StoredCookie {
    fn matches(&self, url: &url::Url, now: f64) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        if self.secure && url.scheme() != "https" {
            return false;
        }
        if let Some(expires) = self.expires {
            if expires > 0.0 && expires < now {
                return false;
            }
        }
        domain_matches(host, &self.domain) && url.path().starts_with(&self.path)
    }
}

/// Cookie domain match: exact host, or a subdomain of a dot-prefixed domain.
fn domain_matches(host: &str, cookie_domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let domain = cookie_domain.trim_start_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    host == domain || host.ends_with(&format!(".{domain}"))
}

impl SessionState {
    /// `Cookie` header value for a request to `url`, if any stored cookie applies.
    #[must_use]
    pub fn cookie_header(&self, url: &str) -> Option<String> {
        let url = url::Url::parse(url).ok()?;
        #[allow(clippy::cast_precision_loss)]
        let now = chrono::Utc::now().timestamp() as f64;

        let pairs: Vec<String> = self
            .cookies
            .iter()
            .filter(|c| c.matches(&url, now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// On-disk location of the persisted session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a session document.
    pub async fn load(&self) -> Result<SessionState> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read session file {}", self.path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse session file {}", self.path.display()))
    }

    /// Persist `state`, replacing any existing session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create session directory {}", parent.display())
            })?;
        }
        let json = serde_json::to_string_pretty(state).context("Failed to serialize session")?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write session file {}", self.path.display()))
    }

    /// Remove the persisted session. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub async fn discard(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e)).with_context(|| {
                format!("Failed to remove session file {}", self.path.display())
            }),
        }
    }
}

/// Human-in-the-loop login step.
///
/// Implementations block until the operator signals that authentication is
/// complete, then return the captured session.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Run the login flow and capture the resulting session.
    ///
    /// # Errors
    ///
    /// Returns an error if the flow cannot be started or no session is captured.
    async fn login(&self) -> Result<SessionState>;
}

/// Decides whether a fresh login is required and owns the persisted session.
pub struct SessionManager<'a> {
    config: &'a Config,
    store: SessionStore,
    authenticator: &'a dyn Authenticator,
}

impl<'a> SessionManager<'a> {
    #[must_use]
    pub fn new(config: &'a Config, authenticator: &'a dyn Authenticator) -> Self {
        Self {
            config,
            store: SessionStore::new(&config.session_state_path),
            authenticator,
        }
    }

    #[must_use]
    pub fn has_persisted_session(&self) -> bool {
        self.store.exists()
    }

    /// Run the interactive login and persist the captured session.
    ///
    /// # Errors
    ///
    /// Returns an error if login fails, captures no cookies, or cannot be persisted.
    pub async fn login(&self) -> Result<SessionState> {
        let state = self.authenticator.login().await.context("Interactive login failed")?;
        if state.is_empty() {
            return Err(ScrapeError::Session("login captured no cookies".to_string()).into());
        }
        self.store.save(&state).await?;
        info!(
            path = %self.store.path().display(),
            cookies = state.cookies.len(),
            "Login state saved"
        );
        Ok(state)
    }

    /// Check that `session` is accepted by the forum.
    ///
    /// Any transport failure, timeout or non-JSON response counts as "not authenticated".
    pub async fn probe(&self, session: &SessionState) -> bool {
        let fetcher = match HttpFetcher::new(session, self.config.probe_timeout) {
            Ok(fetcher) => fetcher,
            Err(e) => {
                warn!("Failed to build probe client: {e:#}");
                return false;
            }
        };

        let url = self.config.category_json_url();
        match fetcher.fetch(&url).await {
            Ok(page) => match page.parse_json::<Value>() {
                Ok(_) => true,
                Err(e) => {
                    debug!("Session probe returned non-JSON: {e}");
                    false
                }
            },
            Err(e) => {
                debug!("Session probe failed: {e:#}");
                false
            }
        }
    }

    /// Return a usable session, logging in interactively if needed.
    ///
    /// # Errors
    ///
    /// Returns an error only if a required login fails; there is no
    /// continuation without credentials.
    pub async fn ensure_session(&self) -> Result<SessionState> {
        if !self.has_persisted_session() {
            info!(
                path = %self.store.path().display(),
                "No persisted session found, launching browser for manual login"
            );
            return self.login().await;
        }

        match self.store.load().await {
            Ok(session) => {
                if self.probe(&session).await {
                    info!("Using existing authenticated session");
                    return Ok(session);
                }
                warn!("Session invalid, re-authenticating");
            }
            Err(e) => warn!("Persisted session unreadable, re-authenticating: {e:#}"),
        }

        self.store.discard().await?;
        self.login().await
    }
}
