use sarpipe_core::domain::report::count_words;
use sarpipe_core::{
    CaseId, Classification, ComplianceOfficerOutput, ComplianceViolation, PipelineError,
    RiskAnalystOutput, RiskLevel, NARRATIVE_WORD_LIMIT, REASONING_CHAR_LIMIT,
    REQUIRED_NARRATIVE_TERMS,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

#[derive(Debug, Deserialize)]
struct RiskPayload {
    classification: Classification,
    confidence: f64,
    risk_level: RiskLevel,
    suspicious_indicators: Vec<String>,
    reasoning: String,
}

#[derive(Debug, Deserialize)]
struct NarrativePayload {
    case_id: String,
    narrative: String,
    word_count: usize,
    regulatory_citations: Vec<String>,
}

fn decode<T>(payload: &Map<String, Value>, schema: &str) -> Result<T, PipelineError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(Value::Object(payload.clone()))
        .map_err(|error| PipelineError::SchemaValidation(format!("{schema}: {error}")))
}

pub fn validate_risk_output(
    payload: &Map<String, Value>,
) -> Result<RiskAnalystOutput, PipelineError> {
    let raw: RiskPayload = decode(payload, "risk analysis")?;

    if !raw.confidence.is_finite() || !(0.0..=1.0).contains(&raw.confidence) {
        return Err(PipelineError::SchemaValidation(format!(
            "risk analysis: confidence {} is outside 0.0..=1.0",
            raw.confidence
        )));
    }

    let reasoning = raw.reasoning.trim().to_string();
    if reasoning.is_empty() {
        return Err(PipelineError::SchemaValidation(
            "risk analysis: reasoning must not be empty".to_string(),
        ));
    }
    let reasoning_chars = reasoning.chars().count();
    if reasoning_chars > REASONING_CHAR_LIMIT {
        return Err(PipelineError::SchemaValidation(format!(
            "risk analysis: reasoning is {reasoning_chars} characters, limit is {REASONING_CHAR_LIMIT}"
        )));
    }

    Ok(RiskAnalystOutput {
        classification: raw.classification,
        confidence: raw.confidence,
        risk_level: raw.risk_level,
        suspicious_indicators: raw
            .suspicious_indicators
            .into_iter()
            .map(|indicator| indicator.trim().to_string())
            .filter(|indicator| !indicator.is_empty())
            .collect(),
        reasoning,
    })
}

/// Builds the narrative output and then applies the filing rules. The
/// model-reported `word_count` must be present but the stored value is
/// always recomputed from the narrative.
pub fn validate_narrative_output(
    payload: &Map<String, Value>,
    expected_case_id: &CaseId,
) -> Result<ComplianceOfficerOutput, PipelineError> {
    let raw: NarrativePayload = decode(payload, "compliance narrative")?;

    if raw.case_id.trim() != expected_case_id.as_str() {
        return Err(PipelineError::SchemaValidation(format!(
            "compliance narrative: case_id `{}` does not match case `{expected_case_id}`",
            raw.case_id
        )));
    }

    let narrative = raw.narrative.trim().to_string();
    if narrative.is_empty() {
        return Err(PipelineError::SchemaValidation(
            "compliance narrative: narrative must not be empty".to_string(),
        ));
    }

    let regulatory_citations = raw
        .regulatory_citations
        .into_iter()
        .map(|citation| citation.trim().to_string())
        .filter(|citation| !citation.is_empty())
        .collect::<Vec<_>>();
    if regulatory_citations.is_empty() {
        return Err(PipelineError::SchemaValidation(
            "compliance narrative: regulatory_citations must not be empty".to_string(),
        ));
    }

    check_narrative_compliance(&narrative)?;

    let word_count = count_words(&narrative);
    if raw.word_count != word_count {
        warn!(
            event_name = "validate.narrative.word_count_mismatch",
            case_id = %expected_case_id,
            reported = raw.word_count,
            counted = word_count,
            "model-reported word count replaced by recount"
        );
    }

    Ok(ComplianceOfficerOutput {
        case_id: expected_case_id.clone(),
        word_count,
        narrative,
        regulatory_citations,
    })
}

/// Word limit first, then terminology; the first failing rule is reported.
pub fn check_narrative_compliance(narrative: &str) -> Result<(), ComplianceViolation> {
    let word_count = count_words(narrative);
    if word_count > NARRATIVE_WORD_LIMIT {
        return Err(ComplianceViolation::WordLimitExceeded {
            word_count,
            limit: NARRATIVE_WORD_LIMIT,
        });
    }

    let lowered = narrative.to_lowercase();
    let missing = REQUIRED_NARRATIVE_TERMS
        .iter()
        .filter(|term| !lowered.contains(**term))
        .map(|term| term.to_string())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(ComplianceViolation::MissingTerms { missing });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use sarpipe_core::{
        CaseId, Classification, ComplianceViolation, PipelineError, RiskLevel,
    };
    use serde_json::{json, Map, Value};

    use super::{check_narrative_compliance, validate_narrative_output, validate_risk_output};

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn words(count: usize) -> String {
        let base = "The customer made a suspicious transaction from the account";
        let mut tokens = base.split(' ').map(str::to_string).collect::<Vec<_>>();
        while tokens.len() < count {
            tokens.push("again".to_string());
        }
        tokens.truncate(count);
        tokens.join(" ")
    }

    fn risk_payload() -> Value {
        json!({
            "classification": "Money_Laundering",
            "confidence": 0.74,
            "risk_level": "High",
            "suspicious_indicators": ["rapid movement of funds", "  "],
            "reasoning": "Layered wires through newly opened accounts."
        })
    }

    #[test]
    fn valid_risk_payload_builds_output() {
        let output = validate_risk_output(&object(risk_payload())).expect("valid payload");

        assert_eq!(output.classification, Classification::MoneyLaundering);
        assert_eq!(output.risk_level, RiskLevel::High);
        assert_eq!(output.suspicious_indicators, vec!["rapid movement of funds".to_string()]);
    }

    #[test]
    fn missing_risk_field_is_schema_error() {
        let mut payload = object(risk_payload());
        payload.remove("risk_level");

        let error = validate_risk_output(&payload).expect_err("missing field");
        assert!(matches!(error, PipelineError::SchemaValidation(ref message) if message.contains("risk_level")));
    }

    #[test]
    fn unknown_classification_is_schema_error() {
        let mut payload = object(risk_payload());
        payload.insert("classification".to_string(), json!("Terrorism"));
        assert!(matches!(
            validate_risk_output(&payload),
            Err(PipelineError::SchemaValidation(_))
        ));
    }

    #[test]
    fn percentage_scale_confidence_is_rejected() {
        let mut payload = object(risk_payload());
        payload.insert("confidence".to_string(), json!(85));

        let error = validate_risk_output(&payload).expect_err("out of range");
        assert!(error.to_string().contains("outside 0.0..=1.0"));
    }

    #[test]
    fn confidence_of_wrong_kind_is_schema_error() {
        let mut payload = object(risk_payload());
        payload.insert("confidence".to_string(), json!("high"));
        assert!(matches!(
            validate_risk_output(&payload),
            Err(PipelineError::SchemaValidation(_))
        ));
    }

    #[test]
    fn overlong_reasoning_is_schema_error() {
        let mut payload = object(risk_payload());
        payload.insert("reasoning".to_string(), json!("x".repeat(501)));
        assert!(matches!(
            validate_risk_output(&payload),
            Err(PipelineError::SchemaValidation(_))
        ));
    }

    #[test]
    fn narrative_within_limit_with_all_terms_passes() {
        assert!(check_narrative_compliance(&words(120)).is_ok());
        assert!(check_narrative_compliance(&words(80)).is_ok());
    }

    #[test]
    fn narrative_of_121_words_cites_limit() {
        let violation = check_narrative_compliance(&words(121)).expect_err("too long");
        assert_eq!(violation, ComplianceViolation::WordLimitExceeded { word_count: 121, limit: 120 });
        assert!(violation.to_string().contains("120-word limit"));
    }

    #[test]
    fn narrative_missing_account_names_the_term() {
        let narrative = words(80).replace("account", "ledger");
        assert_eq!(narrative.split_whitespace().count(), 80);

        let violation = check_narrative_compliance(&narrative).expect_err("missing term");
        assert_eq!(violation, ComplianceViolation::MissingTerms { missing: vec!["account".to_string()] });
    }

    #[test]
    fn terminology_check_is_case_insensitive_and_reports_all_terms() {
        assert!(check_narrative_compliance("SUSPICIOUS Transaction by Customer on Account").is_ok());

        let violation = check_narrative_compliance("Funds moved quickly.").expect_err("no terms");
        assert_eq!(
            violation,
            ComplianceViolation::MissingTerms {
                missing: vec![
                    "suspicious".to_string(),
                    "transaction".to_string(),
                    "customer".to_string(),
                    "account".to_string(),
                ]
            }
        );
    }

    #[test]
    fn narrative_output_recomputes_word_count() {
        let case_id = CaseId("CASE-9".to_string());
        let payload = object(json!({
            "case_id": "CASE-9",
            "narrative": words(40),
            "word_count": 12,
            "regulatory_citations": ["31 CFR 1020.320"]
        }));

        let output = validate_narrative_output(&payload, &case_id).expect("valid narrative");
        assert_eq!(output.word_count, 40);
        assert_eq!(output.case_id, case_id);
    }

    #[test]
    fn narrative_without_word_count_is_schema_error() {
        let payload = object(json!({
            "case_id": "CASE-9",
            "narrative": words(40),
            "regulatory_citations": ["31 CFR 1020.320"]
        }));

        let error = validate_narrative_output(&payload, &CaseId("CASE-9".to_string()))
            .expect_err("word_count is required");
        assert!(matches!(error, PipelineError::SchemaValidation(ref message) if message.contains("word_count")));
    }

    #[test]
    fn negative_word_count_is_schema_error() {
        let payload = object(json!({
            "case_id": "CASE-9",
            "narrative": words(40),
            "word_count": -3,
            "regulatory_citations": ["31 CFR 1020.320"]
        }));

        assert!(matches!(
            validate_narrative_output(&payload, &CaseId("CASE-9".to_string())),
            Err(PipelineError::SchemaValidation(_))
        ));
    }

    #[test]
    fn narrative_for_another_case_is_schema_error() {
        let payload = object(json!({
            "case_id": "CASE-OTHER",
            "narrative": words(40),
            "word_count": 40,
            "regulatory_citations": ["31 CFR 1020.320"]
        }));
        assert!(matches!(
            validate_narrative_output(&payload, &CaseId("CASE-9".to_string())),
            Err(PipelineError::SchemaValidation(_))
        ));
    }

    #[test]
    fn empty_citations_are_schema_error() {
        let payload = object(json!({
            "case_id": "CASE-9",
            "narrative": words(40),
            "word_count": 40,
            "regulatory_citations": []
        }));
        assert!(matches!(
            validate_narrative_output(&payload, &CaseId("CASE-9".to_string())),
            Err(PipelineError::SchemaValidation(_))
        ));
    }

    #[test]
    fn compliance_violation_surfaces_as_pipeline_compliance_error() {
        let payload = object(json!({
            "case_id": "CASE-9",
            "narrative": words(121),
            "word_count": 121,
            "regulatory_citations": ["FinCEN SAR Instructions"]
        }));
        assert!(matches!(
            validate_narrative_output(&payload, &CaseId("CASE-9".to_string())),
            Err(PipelineError::Compliance(ComplianceViolation::WordLimitExceeded { .. }))
        ));
    }
}
