//! Login submission and session establishment.
//!
//! The portal exposes no "login succeeded" response; the only reliable
//! signal is the post-submit navigation away from the login page, so the
//! controller watches the URL. Once redirected, the Angular app publishes
//! its REST context on a window global, which becomes the base path for
//! every authenticated API call in the session.

use std::time::Duration;

use secrecy::ExposeSecret;

use crate::error::ScrapeError;
use crate::models::Credentials;
use crate::page::SessionPage;
use crate::waiter::{wait_until, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};

pub const BASE_URL: &str = "https://login.bankhapoalim.co.il";
const LOGIN_PATH: &str = "/ng-portals/auth/he/?reqName=getLogonPage";

const USER_CODE_SELECTOR: &str = "#userCode";
const PASSWORD_SELECTOR: &str = "#password";
const SUBMIT_SELECTOR: &str = ".login-btn";

const APP_READY_PROBE: &str = "!!window.bnhpApp";
const REST_CONTEXT_EXPR: &str = "window.bnhpApp.restContext";

pub const DEFAULT_REDIRECT_TIMEOUT: Duration = Duration::from_secs(15);
const REDIRECT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Where the controller is in the login flow. `Authenticated` and `Failed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Unauthenticated,
    Submitting,
    AwaitingRedirect,
    Authenticated,
    Failed,
}

/// Drives one page from the login form to an authenticated session.
pub struct SessionController<'a> {
    page: &'a dyn SessionPage,
    state: LoginState,
    selector_timeout: Duration,
}

impl<'a> SessionController<'a> {
    pub fn new(page: &'a dyn SessionPage) -> Self {
        Self {
            page,
            state: LoginState::Unauthenticated,
            selector_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_selector_timeout(mut self, timeout: Duration) -> Self {
        self.selector_timeout = timeout;
        self
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    /// Navigate to the login page, fill both fields, and submit. Absent
    /// credentials are typed as empty strings.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), ScrapeError> {
        self.state = LoginState::Submitting;
        match self.submit(credentials).await {
            Ok(()) => {
                self.state = LoginState::AwaitingRedirect;
                Ok(())
            }
            Err(err) => {
                self.state = LoginState::Failed;
                Err(ScrapeError::general(format!("login failed: {err:#}")))
            }
        }
    }

    async fn submit(&self, credentials: &Credentials) -> anyhow::Result<()> {
        let login_url = format!("{BASE_URL}{LOGIN_PATH}");
        self.page.goto(&login_url).await?;
        self.page
            .wait_for_selector(USER_CODE_SELECTOR, self.selector_timeout)
            .await?;

        let user_code = credentials.user_code.as_deref().unwrap_or("");
        self.page.type_into(USER_CODE_SELECTOR, user_code).await?;

        let password = credentials
            .password
            .as_ref()
            .map(|secret| secret.expose_secret().to_string())
            .unwrap_or_default();
        self.page.type_into(PASSWORD_SELECTOR, &password).await?;

        self.page.click(SUBMIT_SELECTOR).await?;
        tracing::debug!("login form submitted");
        Ok(())
    }

    /// Poll until the page navigates away from where submission left it.
    /// The URL change is the only authentication-success signal available.
    pub async fn wait_for_redirect(&mut self, timeout: Duration) -> Result<(), ScrapeError> {
        let page = self.page;
        let initial = match page.current_url().await {
            Ok(url) => url,
            Err(err) => {
                self.state = LoginState::Failed;
                return Err(ScrapeError::network(format!(
                    "failed to read page url: {err:#}"
                )));
            }
        };

        let outcome = wait_until(
            || {
                let initial = initial.clone();
                async move {
                    let url = page.current_url().await?;
                    Ok(url != initial && !is_ignored_redirect(&url))
                }
            },
            "waiting for post-login redirect",
            timeout,
            REDIRECT_POLL_INTERVAL,
        )
        .await;

        match outcome {
            Ok(()) => {
                self.state = LoginState::Authenticated;
                tracing::debug!("post-login redirect detected");
                Ok(())
            }
            Err(err) => {
                self.state = LoginState::Failed;
                Err(ScrapeError::network(format!(
                    "no redirect after login: {err}"
                )))
            }
        }
    }

    /// Wait for the client app global, then read the REST context used to
    /// build API URLs. The published value embeds a leading separator that
    /// must be discarded.
    pub async fn rest_context(&self) -> Result<String, ScrapeError> {
        let page = self.page;
        wait_until(
            || async move {
                let value = page.evaluate(APP_READY_PROBE).await?;
                Ok(value.as_bool().unwrap_or(false))
            },
            "waiting for app data load",
            DEFAULT_TIMEOUT,
            DEFAULT_POLL_INTERVAL,
        )
        .await
        .map_err(|err| ScrapeError::general(format!("app state never became ready: {err}")))?;

        let value = page
            .evaluate(REST_CONTEXT_EXPR)
            .await
            .map_err(|err| ScrapeError::general(format!("failed to read rest context: {err:#}")))?;
        let raw = value
            .as_str()
            .ok_or_else(|| ScrapeError::general("rest context is not a string"))?;

        let mut chars = raw.chars();
        chars.next();
        Ok(chars.as_str().to_string())
    }
}

/// URLs that do not count as the authenticated app, even though they differ
/// from the login page.
fn is_ignored_redirect(url: &str) -> bool {
    url.is_empty() || url == "about:blank" || url.starts_with("chrome-error://")
}
