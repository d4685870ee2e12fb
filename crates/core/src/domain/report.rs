use serde::{Deserialize, Serialize};

use crate::domain::case::CaseId;

pub const NARRATIVE_WORD_LIMIT: usize = 120;
pub const REASONING_CHAR_LIMIT: usize = 500;
pub const REQUIRED_NARRATIVE_TERMS: [&str; 4] = ["suspicious", "transaction", "customer", "account"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Structuring,
    Sanctions,
    Fraud,
    #[serde(rename = "Money_Laundering")]
    MoneyLaundering,
    Other,
}

impl Classification {
    pub const ALL: [Self; 5] =
        [Self::Structuring, Self::Sanctions, Self::Fraud, Self::MoneyLaundering, Self::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structuring => "Structuring",
            Self::Sanctions => "Sanctions",
            Self::Fraud => "Fraud",
            Self::MoneyLaundering => "Money_Laundering",
            Self::Other => "Other",
        }
    }

    pub fn definition(&self) -> &'static str {
        match self {
            Self::Structuring => "Transactions designed to avoid reporting thresholds",
            Self::Sanctions => "Potential sanctions violations or prohibited parties",
            Self::Fraud => "Fraudulent transactions or identity-related crimes",
            Self::MoneyLaundering => "Complex schemes to obscure illicit fund sources",
            Self::Other => "Suspicious patterns not fitting standard categories",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification produced by the risk analyst stage.
///
/// `confidence` is a fraction in `0.0..=1.0`. The validator rejects anything
/// outside that range, so a constructed value always satisfies it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalystOutput {
    pub classification: Classification,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub suspicious_indicators: Vec<String>,
    pub reasoning: String,
}

impl RiskAnalystOutput {
    pub fn confidence_pct(&self) -> f64 {
        self.confidence * 100.0
    }
}

/// SAR narrative produced by the compliance officer stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceOfficerOutput {
    pub case_id: CaseId,
    pub narrative: String,
    pub word_count: usize,
    pub regulatory_citations: Vec<String>,
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::{count_words, Classification, RiskAnalystOutput, RiskLevel};

    #[test]
    fn money_laundering_uses_underscored_wire_name() {
        let encoded = serde_json::to_string(&Classification::MoneyLaundering).expect("encode");
        assert_eq!(encoded, "\"Money_Laundering\"");

        let decoded: Classification =
            serde_json::from_str("\"Money_Laundering\"").expect("decode wire name");
        assert_eq!(decoded, Classification::MoneyLaundering);
        assert!(serde_json::from_str::<Classification>("\"MoneyLaundering\"").is_err());
    }

    #[test]
    fn word_count_splits_on_any_whitespace() {
        assert_eq!(count_words("  customer\tmoved\n funds  "), 3);
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   "), 0);
    }

    #[test]
    fn confidence_percentage_scales_fraction() {
        let output = RiskAnalystOutput {
            classification: Classification::Structuring,
            confidence: 0.85,
            risk_level: RiskLevel::High,
            suspicious_indicators: vec!["cash deposits under 10k".to_string()],
            reasoning: "repeated sub-threshold deposits".to_string(),
        };
        assert!((output.confidence_pct() - 85.0).abs() < 1e-9);
    }
}
