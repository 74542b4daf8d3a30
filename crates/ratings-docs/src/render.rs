//! Headless Chromium page renderer.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use ratings_core::{DataError, PageRenderer, Result};
use serde::Deserialize;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

/// Fixed wait after the load event for late, script-driven content.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Upper bound on one render, browser launch included.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Timing settings for [`ChromiumRenderer`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Fixed delay applied after the load event fires.
    ///
    /// Requests still in flight at the load event are not tracked; this delay
    /// is the only allowance for them.
    pub settle_delay: Duration,
    /// Budget for the whole render call.
    pub render_timeout: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }
}

/// [`PageRenderer`] that loads pages in a fresh headless Chromium.
///
/// One browser is launched per call and closed before returning, so no state
/// leaks between disclosures.
#[derive(Debug, Clone, Default)]
pub struct ChromiumRenderer {
    config: RenderConfig,
}

impl ChromiumRenderer {
    /// Create a renderer with default timings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer with custom timings.
    #[must_use]
    pub const fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    async fn render_page(&self, url: &str) -> Result<String> {
        let config = BrowserConfig::builder().build().map_err(DataError::Render)?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DataError::Render(format!("Failed to launch browser: {e}")))?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let content = self.load(&browser, url).await;

        if let Err(e) = browser.close().await {
            debug!(error = %e, "Browser did not close cleanly");
        }
        let _ = browser.wait().await;
        events.abort();

        content
    }

    async fn load(&self, browser: &Browser, url: &str) -> Result<String> {
        let page = browser
            .new_page(url)
            .await
            .map_err(|e| DataError::Render(e.to_string()))?;
        // resolves on the load event, not on network idle
        page.wait_for_navigation()
            .await
            .map_err(|e| DataError::Render(e.to_string()))?;

        sleep(self.config.settle_delay).await;

        page.content()
            .await
            .map_err(|e| DataError::Render(e.to_string()))
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &str) -> Result<String> {
        info!(url = %url, "Rendering page in headless browser");
        match timeout(self.config.render_timeout, self.render_page(url)).await {
            Ok(result) => result,
            Err(_) => Err(DataError::Render(format!(
                "Timed out after {}s rendering {url}",
                self.config.render_timeout.as_secs()
            ))),
        }
    }
}
