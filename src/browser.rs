//! Chromium process ownership and page provisioning.
//!
//! A [`BrowserSession`] owns the browser child process plus the CDP event
//! handler task. Scrapes open one isolated page each; pages are the unit
//! of isolation, the session is shared.

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    self, ContinueRequestParams, EventRequestPaused, FailRequestParams, RequestPattern,
    RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::page::CdpPage;

/// Explicit owner of the browser process handle. Launch before any scrape,
/// close at shutdown; scrape calls after `close` are a caller error.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch a Chromium instance. Each call produces an independent
    /// session with its own process.
    pub async fn launch(headless: bool) -> Result<Self> {
        let chrome_path = find_chrome()
            .context("Chrome/Chromium not found. Install Chrome or Chromium to scrape.")?;

        let mut config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .viewport(None)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if !headless {
            config = config.with_head();
        }
        let config = config
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to configure browser: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;
        let handler_task = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        tracing::debug!(headless, "browser session launched");

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Open a fresh page with asset blocking installed.
    pub async fn new_page(&self) -> Result<CdpPage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open page")?;
        block_assets(&page).await?;
        Ok(CdpPage::new(page))
    }

    /// Tear down the browser process and its event handler.
    pub async fn close(self) {
        drop(self.browser);
        self.handler_task.abort();
    }
}

/// Abort image/stylesheet/media/font requests on this page. A bandwidth
/// optimization only; the scrape does not depend on it.
async fn block_assets(page: &chromiumoxide::Page) -> Result<()> {
    let patterns = vec![RequestPattern {
        url_pattern: Some("*".to_string()),
        resource_type: None,
        request_stage: Some(RequestStage::Request),
    }];

    page.execute(fetch::EnableParams {
        patterns: Some(patterns),
        handle_auth_requests: None,
    })
    .await
    .context("Failed to enable request interception")?;

    let mut request_events = page
        .event_listener::<EventRequestPaused>()
        .await
        .context("Failed to listen for intercepted requests")?;
    let page = page.clone();

    tokio::spawn(async move {
        while let Some(event) = request_events.next().await {
            let blocked = matches!(
                &event.resource_type,
                ResourceType::Image
                    | ResourceType::Stylesheet
                    | ResourceType::Media
                    | ResourceType::Font
            );

            let outcome = if blocked {
                page.execute(FailRequestParams {
                    request_id: event.request_id.clone(),
                    error_reason: ErrorReason::Aborted,
                })
                .await
                .map(|_| ())
            } else {
                page.execute(ContinueRequestParams {
                    request_id: event.request_id.clone(),
                    url: None,
                    method: None,
                    post_data: None,
                    headers: None,
                    intercept_response: None,
                })
                .await
                .map(|_| ())
            };

            if let Err(err) = outcome {
                tracing::debug!(error = %err, "request interception response failed");
            }
        }
    });

    Ok(())
}

/// Find a Chrome/Chromium executable.
fn find_chrome() -> Option<String> {
    if let Ok(output) = std::process::Command::new("which")
        .arg("google-chrome")
        .output()
    {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path.is_empty() {
                return Some(path);
            }
        }
    }

    if let Ok(output) = std::process::Command::new("which").arg("chromium").output() {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path.is_empty() {
                return Some(path);
            }
        }
    }

    let candidates = [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/run/current-system/sw/bin/google-chrome",
        "/run/current-system/sw/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    for candidate in candidates {
        if std::path::Path::new(candidate).exists() {
            return Some(candidate.to_string());
        }
    }
    None
}
