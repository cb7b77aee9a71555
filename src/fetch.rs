//! In-page request bridge.
//!
//! Authenticated calls are issued by evaluating a `fetch` invocation inside
//! the page, not through an out-of-process HTTP client: the bank binds the
//! session to browser-managed cookies and an anti-CSRF token that only
//! exists client-side. A 204 response maps to `None`; any other completed
//! response is parsed as the caller's type. No retries here; a failed call
//! surfaces immediately.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::models::TransactionsResponse;
use crate::page::SessionPage;

const XSRF_COOKIE: &str = "XSRF-TOKEN";
const XSRF_HEADER: &str = "X-XSRF-TOKEN";
const POST_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";
const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// Logical page identifier the backend uses for request attribution.
pub const TRANSACTIONS_PAGE_TAG: &str = "/current-account/transactions";

/// Credentialed GET executed in the page context.
pub async fn fetch_get_within_page<T: DeserializeOwned>(
    page: &dyn SessionPage,
    url: &str,
) -> Result<Option<T>> {
    let url_json = serde_json::to_string(url).context("failed to encode url")?;
    let script = format!(
        r#"(() => {{
            return fetch({url_json}, {{
                credentials: "include",
            }}).then((result) => {{
                if (result.status === 204) {{
                    return null;
                }}
                return result.json();
            }});
        }})()"#
    );

    let value = page.evaluate(&script).await?;
    parse_response(value, url)
}

/// Credentialed POST executed in the page context. Caller headers are
/// merged over the default content type and win on collision.
pub async fn fetch_post_within_page<T: DeserializeOwned>(
    page: &dyn SessionPage,
    url: &str,
    body: &impl Serialize,
    extra_headers: BTreeMap<String, String>,
) -> Result<Option<T>> {
    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), POST_CONTENT_TYPE.to_string());
    headers.extend(extra_headers);

    let url_json = serde_json::to_string(url).context("failed to encode url")?;
    let body_json = serde_json::to_string(body).context("failed to encode request body")?;
    let body_literal =
        serde_json::to_string(&body_json).context("failed to encode request body literal")?;
    let headers_json = serde_json::to_string(&headers).context("failed to encode headers")?;
    let script = format!(
        r#"(() => {{
            return fetch({url_json}, {{
                method: "POST",
                body: {body_literal},
                credentials: "include",
                headers: {headers_json},
            }}).then((result) => {{
                if (result.status === 204) {{
                    return null;
                }}
                return result.json();
            }});
        }})()"#
    );

    let value = page.evaluate(&script).await?;
    parse_response(value, url)
}

/// Header set for the transactions endpoint: the session's XSRF cookie
/// echoed as a header (omitted when the cookie is absent), a random
/// correlation id, and the logical page tag.
pub async fn transactions_request_headers(
    page: &dyn SessionPage,
    page_tag: &str,
) -> Result<BTreeMap<String, String>> {
    let cookies = page.cookies().await?;

    let mut headers = BTreeMap::new();
    if let Some(token) = cookies.get(XSRF_COOKIE) {
        headers.insert(XSRF_HEADER.to_string(), token.clone());
    }
    headers.insert("pageUuid".to_string(), page_tag.to_string());
    headers.insert("uuid".to_string(), uuid::Uuid::new_v4().to_string());
    headers.insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());
    Ok(headers)
}

/// Authenticated transactions call: empty JSON-array body plus the XSRF
/// header set.
pub async fn fetch_transactions_within_page(
    page: &dyn SessionPage,
    url: &str,
) -> Result<Option<TransactionsResponse>> {
    let headers = transactions_request_headers(page, TRANSACTIONS_PAGE_TAG).await?;
    let body: Vec<Value> = Vec::new();
    fetch_post_within_page(page, url, &body, headers).await
}

fn parse_response<T: DeserializeOwned>(value: Value, url: &str) -> Result<Option<T>> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .with_context(|| format!("failed to parse response from {url}"))
}
