use std::sync::Arc;

use sarpipe_core::{AgentType, CaseData, CaseId, PipelineError, RiskAnalystOutput};
use serde_json::{Map, Value};

use crate::prompt::{compose_risk_prompt, Prompt};
use crate::runtime::{snapshot, AgentContract, AgentRuntime, Sampling};
use crate::validate::validate_risk_output;

pub const ANALYZE_CASE_ACTION: &str = "analyze_case";
pub const RISK_SAMPLING: Sampling = Sampling { temperature: 0.3, max_tokens: 1000 };

/// Chain-of-Thought classification of a single case.
pub struct RiskClassification<'a> {
    case: &'a CaseData,
}

impl<'a> RiskClassification<'a> {
    pub fn new(case: &'a CaseData) -> Self {
        Self { case }
    }
}

impl AgentContract for RiskClassification<'_> {
    type Output = RiskAnalystOutput;

    fn agent_type(&self) -> AgentType {
        AgentType::RiskAnalyst
    }

    fn action(&self) -> &'static str {
        ANALYZE_CASE_ACTION
    }

    fn case_id(&self) -> &CaseId {
        &self.case.case_id
    }

    fn sampling(&self) -> Sampling {
        RISK_SAMPLING
    }

    fn compose_prompt(&self) -> Prompt {
        compose_risk_prompt(self.case)
    }

    fn input_snapshot(&self) -> Value {
        let mut input = Map::new();
        input.insert("case".to_string(), snapshot(self.case));
        Value::Object(input)
    }

    fn validate(&self, payload: &Map<String, Value>) -> Result<RiskAnalystOutput, PipelineError> {
        validate_risk_output(payload)
    }

    fn success_note(&self) -> &'static str {
        "Chain-of-Thought classification completed"
    }

    fn failure_note(&self) -> &'static str {
        "Chain-of-Thought classification failed"
    }
}

#[derive(Clone)]
pub struct RiskAnalystAgent {
    runtime: Arc<AgentRuntime>,
}

impl RiskAnalystAgent {
    pub fn new(runtime: Arc<AgentRuntime>) -> Self {
        Self { runtime }
    }

    pub async fn analyze_case(&self, case: &CaseData) -> Result<RiskAnalystOutput, PipelineError> {
        self.runtime.invoke(&RiskClassification::new(case)).await
    }
}
