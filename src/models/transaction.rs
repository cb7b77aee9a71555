use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Normal,
}

/// A raw transaction record as returned by the transactions endpoint.
/// Everything but the amount and the activity-type code is optional on the
/// wire; unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedTransaction {
    #[serde(default)]
    pub serial_number: Option<i64>,
    #[serde(default)]
    pub activity_description: Option<String>,
    pub event_amount: f64,
    #[serde(default)]
    pub value_date: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub reference_number: Option<i64>,
    /// Activity-type code `2` marks an outbound (debit) transaction.
    pub event_activity_type_code: i64,
    #[serde(default)]
    pub beneficiary_details_data: Option<BeneficiaryDetails>,
}

/// Free-text beneficiary fields concatenated into the transaction memo.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryDetails {
    #[serde(default)]
    pub party_headline: Option<String>,
    #[serde(default)]
    pub party_name: Option<String>,
    #[serde(default)]
    pub message_headline: Option<String>,
    #[serde(default)]
    pub message_detail: Option<String>,
}

/// Envelope of the transactions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsResponse {
    #[serde(default)]
    pub transactions: Vec<ScrapedTransaction>,
}

/// A normalized transaction in the canonical schema.
///
/// `original_amount` and `charged_amount` always carry the same signed
/// value; the currency is fixed to ILS. Dates are midnight-UTC instants;
/// `None` is the sentinel for an unparseable source date and serializes as
/// JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub identifier: Option<i64>,
    pub date: Option<DateTime<Utc>>,
    pub processed_date: Option<DateTime<Utc>>,
    pub original_amount: f64,
    pub original_currency: String,
    pub charged_amount: f64,
    pub description: String,
    pub status: TransactionStatus,
    pub memo: String,
}
