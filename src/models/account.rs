use serde::{Deserialize, Serialize};

use super::Transaction;

/// One row of the account-listing endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedAccount {
    pub bank_number: String,
    pub branch_number: String,
    pub account_number: String,
}

impl ScrapedAccount {
    /// External identifier for the account: `"<bank>-<branch>-<account>"`.
    /// Unique per account within one scrape.
    pub fn composite_key(&self) -> String {
        format!(
            "{}-{}-{}",
            self.bank_number, self.branch_number, self.account_number
        )
    }
}

/// All normalized transactions for one account. Built once per scrape and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsAccount {
    pub account_number: String,
    pub txns: Vec<Transaction>,
}
