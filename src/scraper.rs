//! Scrape orchestration.
//!
//! Discovers the user's accounts, computes each account's query window,
//! runs the per-account fetches sequentially over one page, normalizes the
//! results, and wraps the whole thing in a lifecycle object that owns the
//! browser session.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, Months, NaiveDate};

use crate::browser::BrowserSession;
use crate::clock::{Clock, SystemClock};
use crate::error::ScrapeError;
use crate::fetch::{fetch_get_within_page, fetch_transactions_within_page};
use crate::models::{Credentials, ScrapedAccount, ScrapingResult, TransactionsAccount};
use crate::normalize::{convert_transactions, DATE_FORMAT};
use crate::page::SessionPage;
use crate::session::{SessionController, BASE_URL, DEFAULT_REDIRECT_TIMEOUT};
use crate::waiter::DEFAULT_TIMEOUT;

const ACCOUNT_DATA_PATH: &str = "/ServerServices/general/accounts";
const BALANCE_SELECTOR: &str = ".currentBalance";
const TXNS_PER_PAGE: u32 = 150;

/// Per-invocation knobs. Defaults match the portal's observed latency.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Earliest transaction date to request. Clamped to the one-year
    /// floor; the window end is always today.
    pub start_date: Option<NaiveDate>,
    pub selector_timeout: Duration,
    pub redirect_timeout: Duration,
    pub balance_timeout: Duration,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            start_date: None,
            selector_timeout: DEFAULT_TIMEOUT,
            redirect_timeout: DEFAULT_REDIRECT_TIMEOUT,
            balance_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Query window for the transactions endpoint:
/// `max(today - 1 year + 1 day, explicit_start)` through today.
pub fn transactions_window(
    clock: &dyn Clock,
    explicit_start: Option<NaiveDate>,
) -> (NaiveDate, NaiveDate) {
    let today = clock.today();
    let floor = today
        .checked_sub_months(Months::new(12))
        .and_then(|date| date.checked_add_days(Days::new(1)))
        .unwrap_or(today);

    let start = match explicit_start {
        Some(explicit) => explicit.max(floor),
        None => floor,
    };
    (start, today)
}

pub fn transactions_url(
    api_site_url: &str,
    account_key: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> String {
    format!(
        "{api_site_url}/current-account/transactions?accountId={account_key}\
         &numItemsPerPage={TXNS_PER_PAGE}&retrievalEndDate={}&retrievalStartDate={}&sortCode=1",
        end.format(DATE_FORMAT),
        start.format(DATE_FORMAT),
    )
}

/// Page-level scrape flow. Independent of browser ownership so a scripted
/// page can drive it. Never fails outright: every internal failure comes
/// back as the error-shaped result.
pub async fn scrape_account_data(
    page: &dyn SessionPage,
    clock: &dyn Clock,
    credentials: &Credentials,
    options: &ScrapeOptions,
) -> ScrapingResult {
    match run_scrape(page, clock, credentials, options).await {
        Ok((current_balance, accounts)) => ScrapingResult::completed(current_balance, accounts),
        Err(err) => {
            tracing::warn!(kind = %err.kind, error = %err, "scrape failed");
            ScrapingResult::failed(&err)
        }
    }
}

async fn run_scrape(
    page: &dyn SessionPage,
    clock: &dyn Clock,
    credentials: &Credentials,
    options: &ScrapeOptions,
) -> Result<(String, Vec<TransactionsAccount>), ScrapeError> {
    let mut controller =
        SessionController::new(page).with_selector_timeout(options.selector_timeout);
    controller.login(credentials).await?;
    controller.wait_for_redirect(options.redirect_timeout).await?;

    let rest_context = controller.rest_context().await?;
    let api_site_url = format!("{BASE_URL}/{rest_context}");
    let account_data_url = format!("{BASE_URL}{ACCOUNT_DATA_PATH}");

    // A null listing means no accounts, not a failure.
    let accounts_info: Vec<ScrapedAccount> = fetch_get_within_page(page, &account_data_url)
        .await
        .map_err(|err| ScrapeError::general(format!("account discovery failed: {err:#}")))?
        .unwrap_or_default();
    tracing::debug!(count = accounts_info.len(), "accounts discovered");

    let (start, end) = transactions_window(clock, options.start_date);

    // One shared page context, so the per-account fetches stay sequential
    // in discovery order.
    let mut accounts = Vec::with_capacity(accounts_info.len());
    for info in &accounts_info {
        let account_number = info.composite_key();
        let url = transactions_url(&api_site_url, &account_number, start, end);
        let response = fetch_transactions_within_page(page, &url)
            .await
            .map_err(|err| {
                ScrapeError::general(format!(
                    "transaction fetch failed for {account_number}: {err:#}"
                ))
            })?;

        let txns = match response {
            Some(body) => convert_transactions(body.transactions),
            None => {
                tracing::debug!(account = %account_number, "no transaction data returned");
                Vec::new()
            }
        };
        accounts.push(TransactionsAccount {
            account_number,
            txns,
        });
    }

    let current_balance = read_balance(page, options.balance_timeout).await;
    Ok((current_balance, accounts))
}

/// Best effort: the on-screen balance is informational, so absence or a
/// timeout degrades to an empty string instead of failing the scrape.
async fn read_balance(page: &dyn SessionPage, timeout: Duration) -> String {
    let text = async {
        page.wait_for_selector(BALANCE_SELECTOR, timeout).await?;
        page.element_text(BALANCE_SELECTOR).await
    }
    .await;

    match text {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(error = %err, "balance read failed, returning empty balance");
            String::new()
        }
    }
}

/// Browser-owning lifecycle wrapper around the scrape flow.
pub struct Scraper {
    session: BrowserSession,
    clock: Arc<dyn Clock>,
    options: ScrapeOptions,
}

impl Scraper {
    /// Launch a browser session. Each call produces an independent scraper;
    /// call [`Scraper::close`] at shutdown.
    pub async fn setup(headless: bool) -> anyhow::Result<Self> {
        let session = BrowserSession::launch(headless).await?;
        Ok(Self {
            session,
            clock: Arc::new(SystemClock),
            options: ScrapeOptions::default(),
        })
    }

    pub fn with_options(mut self, options: ScrapeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run one scrape on a fresh page. Always resolves to a result; the
    /// page is closed on both the success and the failure path.
    pub async fn get_account_data(&self, credentials: &Credentials) -> ScrapingResult {
        let page = match self.session.new_page().await {
            Ok(page) => page,
            Err(err) => {
                return ScrapingResult::failed(&ScrapeError::general(format!(
                    "failed to open page: {err:#}"
                )))
            }
        };

        let result =
            scrape_account_data(&page, self.clock.as_ref(), credentials, &self.options).await;

        if let Err(err) = page.close().await {
            tracing::debug!(error = %err, "failed to close scrape page");
        }
        result
    }

    pub async fn close(self) {
        self.session.close().await;
    }
}
