use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(pub String);

impl CaseId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerData {
    pub customer_id: String,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub risk_rating: String,
    pub onboarding_date: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountData {
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub account_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_date: Option<NaiveDate>,
    pub current_balance: Decimal,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub transaction_date: NaiveDate,
    pub amount: Decimal,
    pub method: String,
    pub transaction_type: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A single investigation case as handed over by case management.
///
/// Accounts and transactions keep the order they were supplied in; the
/// transaction sequence is expected most-recent-first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseData {
    pub case_id: CaseId,
    pub customer: CustomerData,
    #[serde(default)]
    pub accounts: Vec<AccountData>,
    #[serde(default)]
    pub transactions: Vec<TransactionData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data_sources: BTreeMap<String, String>,
}

impl CaseData {
    /// `None` once the running sum leaves the `Decimal` range.
    pub fn total_balance(&self) -> Option<Decimal> {
        checked_sum(self.accounts.iter().map(|account| account.current_balance))
    }

    pub fn total_transaction_volume(&self) -> Option<Decimal> {
        checked_sum(self.transactions.iter().map(|transaction| transaction.amount))
    }

    pub fn average_transaction_amount(&self) -> Option<Decimal> {
        if self.transactions.is_empty() {
            return Some(Decimal::ZERO);
        }
        self.total_transaction_volume()?.checked_div(Decimal::from(self.transactions.len()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    values.try_fold(Decimal::ZERO, Decimal::checked_add)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::CaseData;

    const CASE_JSON: &str = r#"{
        "case_id": "CASE-0001",
        "customer": {
            "customer_id": "CUST-7",
            "name": "Dana Whitfield",
            "date_of_birth": "1981-03-14",
            "risk_rating": "Medium",
            "onboarding_date": "2019-06-01"
        },
        "accounts": [
            {"account_id": "ACC-1", "account_type": "Checking", "current_balance": "1000.00", "status": "Active"},
            {"account_id": "ACC-2", "account_type": "Savings", "current_balance": "-250.50", "status": "Frozen"}
        ],
        "transactions": [
            {"transaction_date": "2024-02-03", "amount": "9500.00", "method": "Cash", "transaction_type": "Deposit", "description": "Branch deposit"},
            {"transaction_date": "2024-02-01", "amount": "500.00", "method": "Wire", "transaction_type": "Withdrawal", "description": "Outbound wire"}
        ]
    }"#;

    #[test]
    fn parses_case_json_with_decimal_strings() {
        let case = CaseData::from_json_str(CASE_JSON).expect("case json should parse");

        assert_eq!(case.case_id.as_str(), "CASE-0001");
        assert_eq!(case.accounts.len(), 2);
        assert_eq!(case.accounts[1].current_balance, Decimal::new(-25050, 2));
        assert!(case.data_sources.is_empty());
        assert!(case.case_created_at.is_none());
    }

    #[test]
    fn summary_figures_use_exact_decimals() {
        let case = CaseData::from_json_str(CASE_JSON).expect("case json should parse");

        assert_eq!(case.total_balance(), Some(Decimal::new(74950, 2)));
        assert_eq!(case.total_transaction_volume(), Some(Decimal::new(1_000_000, 2)));
        assert_eq!(case.average_transaction_amount(), Some(Decimal::new(500_000, 2)));
    }

    #[test]
    fn average_of_empty_transaction_list_is_zero() {
        let mut case = CaseData::from_json_str(CASE_JSON).expect("case json should parse");
        case.transactions.clear();
        assert_eq!(case.average_transaction_amount(), Some(Decimal::ZERO));
    }

    #[test]
    fn summary_figures_report_overflow_instead_of_panicking() {
        let mut case = CaseData::from_json_str(CASE_JSON).expect("case json should parse");
        let near_max = Decimal::from_str("50000000000000000000000000000").expect("decimal literal");
        for account in &mut case.accounts {
            account.current_balance = near_max;
        }
        for transaction in &mut case.transactions {
            transaction.amount = near_max;
        }

        assert_eq!(case.total_balance(), None);
        assert_eq!(case.total_transaction_volume(), None);
        assert_eq!(case.average_transaction_amount(), None);

        case.transactions.truncate(1);
        assert_eq!(case.total_transaction_volume(), Some(near_max));
    }
}
