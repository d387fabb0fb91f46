//! Interactive login through a visible Chromium window.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::Cookie;
use futures_util::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use super::{Authenticator, SessionState, StoredCookie};
use crate::config::Config;

const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 900;

/// Opens the forum login page in a headed browser and waits for the operator
/// to press Enter on stdin before capturing cookies.
#[derive(Debug, Clone)]
pub struct BrowserLogin {
    base_url: String,
    login_url: String,
    chrome_path: Option<String>,
}

impl BrowserLogin {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            login_url: config.login_url(),
            chrome_path: config.chrome_path.clone(),
        }
    }

    async fn capture(&self, browser: &Browser) -> Result<SessionState> {
        let page = browser
            .new_page(self.login_url.as_str())
            .await
            .context("Failed to open login page")?;

        info!(url = %self.login_url, "Log in using the browser window, then press Enter here to continue");
        wait_for_operator().await?;

        // Return to the forum so the page's cookie scope covers its domain.
        page.goto(self.base_url.as_str())
            .await
            .context("Failed to navigate back to the forum")?;

        let cookies = page
            .get_cookies()
            .await
            .context("Failed to read cookies from browser")?;

        debug!(count = cookies.len(), "Captured browser cookies");

        Ok(SessionState {
            cookies: cookies.into_iter().map(StoredCookie::from).collect(),
            origins: Vec::new(),
        })
    }
}

#[async_trait]
impl Authenticator for BrowserLogin {
    async fn login(&self) -> Result<SessionState> {
        let mut config_builder = BrowserConfig::builder()
            .with_head()
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        if let Some(ref chrome_path) = self.chrome_path {
            config_builder = config_builder.chrome_executable(chrome_path);
        }

        let browser_config = config_builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch browser")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {e}");
                }
            }
        });

        let result = self.capture(&browser).await;

        if let Err(e) = browser.close().await {
            warn!("Failed to close browser: {e}");
        }
        handler_task.abort();

        result
    }
}

/// Block until a line (or EOF) arrives on stdin.
async fn wait_for_operator() -> Result<()> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read login confirmation from stdin")?;
    Ok(())
}

impl From<Cookie> for StoredCookie {
    fn from(cookie: Cookie) -> Self {
        Self {
            name: cookie.name,
            value: cookie.value,
            domain: cookie.domain,
            path: cookie.path,
            expires: if cookie.session {
                None
            } else {
                Some(cookie.expires)
            },
            http_only: cookie.http_only,
            secure: cookie.secure,
            same_site: cookie.same_site.map(|s| format!("{s:?}")),
        }
    }
}
