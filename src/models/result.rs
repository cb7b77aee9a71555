use serde::{Deserialize, Serialize};

use crate::error::{ErrorType, ScrapeError};

use super::TransactionsAccount;

/// Top-level output of one scrape invocation.
///
/// Exactly one of the two shapes is ever populated: the success fields
/// (`current_balance`, `accounts`) or the error fields (`error_message`,
/// `error_type`). The constructors are the only way the crate builds one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_balance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Vec<TransactionsAccount>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorType>,
}

impl ScrapingResult {
    pub fn completed(
        current_balance: impl Into<String>,
        accounts: Vec<TransactionsAccount>,
    ) -> Self {
        Self {
            success: true,
            current_balance: Some(current_balance.into()),
            accounts: Some(accounts),
            error_message: None,
            error_type: None,
        }
    }

    pub fn failed(error: &ScrapeError) -> Self {
        Self {
            success: false,
            current_balance: None,
            accounts: None,
            error_message: Some(error.message.clone()),
            error_type: Some(error.kind),
        }
    }
}
