//! Raw-to-canonical transaction shaping. Pure; no page access.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    BeneficiaryDetails, ScrapedTransaction, Transaction, TransactionStatus, TransactionType,
};

pub const DATE_FORMAT: &str = "%Y%m%d";
const CURRENCY: &str = "ILS";

/// Activity-type code the bank uses for outbound (debit) movements.
const OUTBOUND_ACTIVITY_TYPE: i64 = 2;

/// Convert raw records into the canonical schema, preserving order.
pub fn convert_transactions(txns: Vec<ScrapedTransaction>) -> Vec<Transaction> {
    txns.into_iter().map(convert_transaction).collect()
}

fn convert_transaction(txn: ScrapedTransaction) -> Transaction {
    let outbound = txn.event_activity_type_code == OUTBOUND_ACTIVITY_TYPE;
    let amount = if outbound {
        -txn.event_amount
    } else {
        txn.event_amount
    };

    let status = if txn.serial_number == Some(0) {
        TransactionStatus::Pending
    } else {
        TransactionStatus::Completed
    };

    Transaction {
        kind: TransactionType::Normal,
        identifier: txn.reference_number,
        date: parse_event_date(txn.event_date.as_deref()),
        processed_date: parse_event_date(txn.value_date.as_deref()),
        original_amount: amount,
        original_currency: CURRENCY.to_string(),
        charged_amount: amount,
        description: txn.activity_description.unwrap_or_default(),
        status,
        memo: build_memo(txn.beneficiary_details_data.as_ref()),
    }
}

/// `YYYYMMDD` at midnight UTC. Anything missing or unparseable maps to
/// the `None` sentinel, never a panic.
pub fn parse_event_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Space-joined beneficiary fields in fixed order; party name and message
/// detail each get a trailing period. Empty fields are skipped.
fn build_memo(details: Option<&BeneficiaryDetails>) -> String {
    let Some(details) = details else {
        return String::new();
    };

    let mut lines: Vec<String> = Vec::new();
    if let Some(value) = non_empty(details.party_headline.as_deref()) {
        lines.push(value.to_string());
    }
    if let Some(value) = non_empty(details.party_name.as_deref()) {
        lines.push(format!("{value}."));
    }
    if let Some(value) = non_empty(details.message_headline.as_deref()) {
        lines.push(value.to_string());
    }
    if let Some(value) = non_empty(details.message_detail.as_deref()) {
        lines.push(format!("{value}."));
    }
    lines.join(" ")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn raw(amount: f64, activity_type: i64) -> ScrapedTransaction {
        ScrapedTransaction {
            serial_number: Some(1),
            activity_description: Some("Transfer".to_string()),
            event_amount: amount,
            value_date: Some("20260102".to_string()),
            event_date: Some("20260101".to_string()),
            reference_number: Some(991),
            event_activity_type_code: activity_type,
            beneficiary_details_data: None,
        }
    }

    #[test]
    fn outbound_transactions_are_negated() {
        let converted = convert_transactions(vec![raw(120.5, 2)]);
        assert_eq!(converted[0].original_amount, -120.5);
        assert_eq!(converted[0].charged_amount, -120.5);
    }

    #[test]
    fn inbound_transactions_keep_their_sign() {
        let converted = convert_transactions(vec![raw(75.0, 1)]);
        assert_eq!(converted[0].original_amount, 75.0);
        assert_eq!(converted[0].charged_amount, 75.0);
        assert_eq!(converted[0].original_currency, "ILS");
    }

    #[test]
    fn serial_number_zero_means_pending() {
        let mut pending = raw(10.0, 1);
        pending.serial_number = Some(0);
        let mut completed = raw(10.0, 1);
        completed.serial_number = Some(42);
        let mut absent = raw(10.0, 1);
        absent.serial_number = None;

        let converted = convert_transactions(vec![pending, completed, absent]);
        assert_eq!(converted[0].status, TransactionStatus::Pending);
        assert_eq!(converted[1].status, TransactionStatus::Completed);
        assert_eq!(converted[2].status, TransactionStatus::Completed);
    }

    #[test]
    fn dates_parse_to_midnight_utc() {
        let converted = convert_transactions(vec![raw(10.0, 1)]);
        assert_eq!(
            converted[0].date,
            Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            converted[0].processed_date,
            Some(Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn invalid_or_missing_dates_become_the_none_sentinel() {
        assert_eq!(parse_event_date(None), None);
        assert_eq!(parse_event_date(Some("")), None);
        assert_eq!(parse_event_date(Some("not-a-date")), None);
        assert_eq!(parse_event_date(Some("20269999")), None);

        let mut txn = raw(10.0, 1);
        txn.event_date = Some("bogus".to_string());
        txn.value_date = None;
        let converted = convert_transactions(vec![txn]);
        assert_eq!(converted[0].date, None);
        assert_eq!(converted[0].processed_date, None);
    }

    #[test]
    fn memo_fields_join_in_fixed_order() {
        let mut txn = raw(10.0, 1);
        txn.beneficiary_details_data = Some(BeneficiaryDetails {
            party_headline: Some("A".to_string()),
            party_name: Some("B".to_string()),
            message_headline: Some("C".to_string()),
            message_detail: Some("D".to_string()),
        });
        let converted = convert_transactions(vec![txn]);
        assert_eq!(converted[0].memo, "A B. C D.");
    }

    #[test]
    fn memo_skips_absent_and_empty_fields() {
        let mut txn = raw(10.0, 1);
        txn.beneficiary_details_data = Some(BeneficiaryDetails {
            party_headline: None,
            party_name: Some("Landlord".to_string()),
            message_headline: Some(String::new()),
            message_detail: None,
        });
        let converted = convert_transactions(vec![txn]);
        assert_eq!(converted[0].memo, "Landlord.");

        let mut bare = raw(10.0, 1);
        bare.beneficiary_details_data = None;
        let converted = convert_transactions(vec![bare]);
        assert_eq!(converted[0].memo, "");
    }

    #[test]
    fn missing_description_defaults_to_empty() {
        let mut txn = raw(10.0, 1);
        txn.activity_description = None;
        let converted = convert_transactions(vec![txn]);
        assert_eq!(converted[0].description, "");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(convert_transactions(Vec::new()).is_empty());
    }

    #[test]
    fn order_is_preserved() {
        let converted = convert_transactions(vec![raw(1.0, 1), raw(2.0, 1), raw(3.0, 1)]);
        let amounts: Vec<f64> = converted.iter().map(|t| t.original_amount).collect();
        assert_eq!(amounts, vec![1.0, 2.0, 3.0]);
    }
}
