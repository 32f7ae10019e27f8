use std::time::Duration;

use anyhow::{anyhow, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::dom::Document;

use super::cdp_dom::{build_document, extract_trees, RawCdpTrees, CDP_TIMEOUT};

const LAUNCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Browser window size used for captures
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280, height: 720 }
    }
}

/// One Chrome instance with a single page, used to load a URL and capture
/// its DOM
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch Chrome on `about:blank`
    pub async fn launch(headless: bool, viewport: Viewport) -> Result<Self> {
        let mut config = BrowserConfig::builder().window_size(viewport.width, viewport.height);
        if !headless {
            config = config.with_head();
        }
        config = config
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions");
        let config = config.build().map_err(|e| anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = timeout(LAUNCH_TIMEOUT, Browser::launch(config))
            .await
            .map_err(|_| anyhow!("Browser launch timeout (30s) - Chrome may not be installed or is unresponsive"))?
            .map_err(|e| anyhow!("Failed to launch browser: {}", e))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                tracing::trace!("Browser event: {:?}", event);
            }
        });

        let page = timeout(CDP_TIMEOUT, browser.new_page("about:blank"))
            .await
            .map_err(|_| anyhow!("Timed out creating page"))?
            .map_err(|e| anyhow!("Failed to create page: {}", e))?;

        tracing::info!("Browser launched ({})", if headless { "headless" } else { "headed" });
        Ok(Self { browser, page, handler })
    }

    /// Navigate; resolves once the page has loaded
    pub async fn navigate(&self, url: &str) -> Result<()> {
        timeout(CDP_TIMEOUT, self.page.goto(url))
            .await
            .map_err(|_| anyhow!("Navigation to {} timed out", url))?
            .map_err(|e| anyhow!("Failed to navigate to {}: {}", url, e))?;
        tracing::info!("Navigated to {}", url);
        Ok(())
    }

    pub async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await
            .map_err(|e| anyhow!("Failed to get URL: {}", e))?
            .ok_or_else(|| anyhow!("URL is None"))
    }

    /// Raw CDP trees of the current page, for storing as a snapshot file
    pub async fn capture_raw(&self) -> Result<RawCdpTrees> {
        extract_trees(&self.page).await
    }

    pub async fn capture(&self) -> Result<Document> {
        let raw = self.capture_raw().await?;
        build_document(&raw)
    }

    pub async fn close(mut self) -> Result<()> {
        if let Err(e) = self.page.close().await {
            tracing::warn!("Failed to close page: {}", e);
        }
        self.browser.close().await.map_err(|e| anyhow!("Failed to close browser: {}", e))?;
        self.handler.abort();
        tracing::info!("Browser closed");
        Ok(())
    }
}
