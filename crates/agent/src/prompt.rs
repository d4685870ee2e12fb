//! Deterministic prompt composition for both agents.
//!
//! Every function here is a pure function of its inputs: the same case (and
//! upstream analysis) always renders byte-identical text.

use std::fmt::Write as _;

use rust_decimal::{Decimal, RoundingStrategy};
use sarpipe_core::{
    AccountData, CaseData, Classification, RiskAnalystOutput, TransactionData, NARRATIVE_WORD_LIMIT,
    REASONING_CHAR_LIMIT,
};

pub const MAX_PROMPT_TRANSACTIONS: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub fn risk_analyst_system_instruction() -> String {
    let mut categories = String::new();
    for classification in Classification::ALL {
        let _ = writeln!(
            categories,
            "   - \"{}\": {}",
            classification.as_str(),
            classification.definition()
        );
    }

    format!(
        "You are a Senior Financial Crime Risk Analyst specializing in Anti-Money Laundering (AML) \
investigations. Analyze the case using the following 5-step Chain-of-Thought framework, then \
produce a single classification decision.

1. Data Review: summarize key customer, account, and transaction details.
2. Pattern Recognition: identify suspicious behaviors or typologies.
3. Regulatory Mapping: link the behavior to AML rules or precedents.
4. Risk Quantification: assess severity based on volume, velocity, geography, and profile.
5. Classification Decision: choose exactly one category:
{categories}
Respond with one JSON object inside a ```json fenced block, using exactly these fields:
{{
  \"classification\": \"<Structuring | Sanctions | Fraud | Money_Laundering | Other>\",
  \"confidence\": <number between 0.0 and 1.0>,
  \"risk_level\": \"<Low | Medium | High | Critical>\",
  \"suspicious_indicators\": [\"<indicator>\", \"...\"],
  \"reasoning\": \"<summary of rationale, at most {REASONING_CHAR_LIMIT} characters>\"
}}"
    )
}

pub fn compliance_officer_system_instruction() -> String {
    format!(
        "You are a Senior Compliance Officer specializing in Anti-Money Laundering (AML) and \
suspicious activity reporting. Generate a concise, regulatory-compliant SAR narrative using the \
ReACT (Reasoning + Action) framework.

REASONING phase:
1. Review the risk analyst's findings.
2. Assess regulatory narrative requirements.
3. Identify key compliance elements.
4. Plan the narrative structure.

ACTION phase:
1. Draft a SAR narrative of at most {NARRATIVE_WORD_LIMIT} words.
2. Include specific customer details, transaction amounts, and dates.
3. Reference the suspicious activity pattern.
4. Use regulatory language and cite relevant rules (e.g. 31 CFR 1020.320, 12 CFR 21.11, FinCEN SAR Instructions).

The narrative must identify the customer, describe the suspicious activity, give transaction \
details, justify the suspicion, and use the words \"suspicious\", \"transaction\", \"customer\" \
and \"account\".

Respond with one JSON object inside a ```json fenced block, using exactly these fields:
{{
  \"case_id\": \"<case id from the prompt>\",
  \"narrative\": \"<SAR narrative, at most {NARRATIVE_WORD_LIMIT} words>\",
  \"word_count\": <integer>,
  \"regulatory_citations\": [\"<citation>\", \"...\"]
}}"
    )
}

pub fn compose_risk_prompt(case: &CaseData) -> Prompt {
    let mut user = String::new();
    let _ = writeln!(user, "Case ID: {}", case.case_id);
    user.push('\n');
    user.push_str(&format_customer(case));
    user.push('\n');
    user.push_str(&format_accounts(&case.accounts));
    user.push('\n');
    user.push_str(&format_transactions(&case.transactions));
    user.push('\n');
    user.push_str(&format_financial_summary(case));

    Prompt { system: risk_analyst_system_instruction(), user }
}

pub fn compose_narrative_prompt(case: &CaseData, risk: &RiskAnalystOutput) -> Prompt {
    let mut user = String::new();
    let _ = writeln!(user, "Case ID: {}", case.case_id);
    let _ = writeln!(user, "Customer: {} ({})", case.customer.name, case.customer.customer_id);
    user.push('\n');
    user.push_str(&format_accounts(&case.accounts));
    user.push('\n');
    user.push_str(&format_transactions(&case.transactions));
    user.push('\n');
    user.push_str("Risk Findings:\n");
    user.push_str(&format_risk_analysis(risk));

    Prompt { system: compliance_officer_system_instruction(), user }
}

pub fn format_customer(case: &CaseData) -> String {
    let customer = &case.customer;
    let mut out = String::from("Customer Profile:\n");
    let _ = writeln!(out, "- ID: {}", customer.customer_id);
    let _ = writeln!(out, "- Name: {}", customer.name);
    let _ = writeln!(out, "- Date of Birth: {}", customer.date_of_birth);
    let _ = writeln!(out, "- Risk Rating: {}", customer.risk_rating);
    let _ = writeln!(out, "- Customer Since: {}", customer.onboarding_date);
    out
}

pub fn format_accounts(accounts: &[AccountData]) -> String {
    if accounts.is_empty() {
        return "Accounts (0):\nNo accounts available.\n".to_string();
    }

    let mut out = format!("Accounts ({}):\n", accounts.len());
    for (index, account) in accounts.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {}: {}, Balance: {}, Status: {}",
            index + 1,
            account.account_id,
            account.account_type,
            format_currency(account.current_balance),
            account.status
        );
    }
    out
}

/// Renders at most [`MAX_PROMPT_TRANSACTIONS`] entries, taken from the front
/// of the (most-recent-first) sequence.
pub fn format_transactions(transactions: &[TransactionData]) -> String {
    if transactions.is_empty() {
        return "Transactions (0):\nNo transactions available.\n".to_string();
    }

    let shown = transactions.len().min(MAX_PROMPT_TRANSACTIONS);
    let mut out =
        format!("Transactions ({} total, showing {} most recent):\n", transactions.len(), shown);
    for (index, transaction) in transactions.iter().take(shown).enumerate() {
        let _ = write!(
            out,
            "{}. {}: {} {} via {}",
            index + 1,
            transaction.transaction_date,
            transaction.transaction_type,
            format_currency(transaction.amount),
            transaction.method
        );
        if let Some(counterparty) = &transaction.counterparty {
            let _ = write!(out, ", counterparty {counterparty}");
        }
        if let Some(location) = &transaction.location {
            let _ = write!(out, ", at {location}");
        }
        let _ = writeln!(out, " - {}", transaction.description);
    }
    out
}

pub fn format_financial_summary(case: &CaseData) -> String {
    let mut out = String::from("Financial Summary:\n");
    let _ = writeln!(out, "- Total Account Balance: {}", format_figure(case.total_balance()));
    let _ = writeln!(
        out,
        "- Total Transaction Volume: {}",
        format_figure(case.total_transaction_volume())
    );
    let _ = writeln!(
        out,
        "- Average Transaction Amount: {}",
        format_figure(case.average_transaction_amount())
    );
    out
}

pub fn format_risk_analysis(risk: &RiskAnalystOutput) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Classification: {} (Confidence: {:.1}%)",
        risk.classification,
        risk.confidence_pct()
    );
    let _ = writeln!(out, "Risk Level: {}", risk.risk_level);
    out.push_str("Suspicious Indicators:\n");
    if risk.suspicious_indicators.is_empty() {
        out.push_str("- none reported\n");
    }
    for indicator in &risk.suspicious_indicators {
        let _ = writeln!(out, "- {indicator}");
    }
    let _ = writeln!(out, "Analyst Reasoning: {}", risk.reasoning);
    out
}

/// `$1,234.56` style rendering; the decimal itself is never modified.
/// Summary figures that overflowed the decimal range render as `n/a`.
fn format_figure(amount: Option<Decimal>) -> String {
    amount.map(format_currency).unwrap_or_else(|| "n/a".to_string())
}

pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{cents}")
}
