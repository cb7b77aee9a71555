//! The narrow seam between the scrape flow and the browser page.
//!
//! Everything the scraper needs from a page goes through [`SessionPage`],
//! so the whole flow can run against a scripted implementation in tests.
//! [`CdpPage`] is the production binding over a chromiumoxide page.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use serde_json::Value;

use crate::waiter::wait_until;

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Capability interface over one authenticated browser page.
///
/// `evaluate` runs a script in the page's execution context with promises
/// awaited, which is what lets the request bridge ride on the page's own
/// cookie jar.
#[async_trait]
pub trait SessionPage: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// Resolves once an element matching `selector` exists in the DOM.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()>;

    async fn type_into(&self, selector: &str, text: &str) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()>;

    /// Inner HTML of the first element matching `selector`. Fails when the
    /// element is absent.
    async fn element_text(&self, selector: &str) -> Result<String>;

    /// Evaluate a script and return its value as JSON, awaiting promises.
    async fn evaluate(&self, expression: &str) -> Result<Value>;

    /// Session cookies visible to this page, as name/value pairs.
    async fn cookies(&self) -> Result<HashMap<String, String>>;

    async fn close(&self) -> Result<()>;
}

/// [`SessionPage`] backed by a Chrome DevTools Protocol page.
#[derive(Clone)]
pub struct CdpPage {
    page: Page,
}

impl CdpPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn inner(&self) -> &Page {
        &self.page
    }
}

#[async_trait]
impl SessionPage for CdpPage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("navigation to {url} failed"))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let url = self.page.url().await.context("failed to read page url")?;
        Ok(url.unwrap_or_default())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let page = &self.page;
        wait_until(
            || {
                let selector = selector.to_string();
                async move { Ok(page.find_element(selector).await.is_ok()) }
            },
            &format!("waiting for selector {selector}"),
            timeout,
            SELECTOR_POLL_INTERVAL,
        )
        .await?;
        Ok(())
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("element {selector} not found"))?;
        element
            .click()
            .await
            .with_context(|| format!("failed to focus {selector}"))?;
        element
            .type_str(text)
            .await
            .with_context(|| format!("failed to type into {selector}"))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("element {selector} not found"))?;
        element
            .click()
            .await
            .with_context(|| format!("failed to click {selector}"))?;
        Ok(())
    }

    async fn element_text(&self, selector: &str) -> Result<String> {
        let selector_json =
            serde_json::to_string(selector).context("failed to encode selector")?;
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({selector_json});
                if (!el) throw new Error('element not found: ' + {selector_json});
                return el.innerHTML;
            }})()"#
        );
        let value = self.evaluate(&script).await?;
        value
            .as_str()
            .map(|text| text.to_string())
            .with_context(|| format!("element {selector} did not yield text"))
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        let result = self
            .page
            .evaluate(expression.to_string())
            .await
            .context("script evaluation failed")?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn cookies(&self) -> Result<HashMap<String, String>> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .context("failed to read cookies")?;
        Ok(cookies
            .into_iter()
            .map(|cookie| (cookie.name, cookie.value))
            .collect())
    }

    async fn close(&self) -> Result<()> {
        self.page
            .clone()
            .close()
            .await
            .context("failed to close page")?;
        Ok(())
    }
}
