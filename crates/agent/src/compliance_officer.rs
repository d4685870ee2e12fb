use std::sync::Arc;

use sarpipe_core::{
    AgentType, CaseData, CaseId, ComplianceOfficerOutput, PipelineError, RiskAnalystOutput,
};
use serde_json::{Map, Value};

use crate::prompt::{compose_narrative_prompt, Prompt};
use crate::runtime::{snapshot, AgentContract, AgentRuntime, Sampling};
use crate::validate::validate_narrative_output;

pub const GENERATE_NARRATIVE_ACTION: &str = "generate_compliance_narrative";
pub const NARRATIVE_SAMPLING: Sampling = Sampling { temperature: 0.3, max_tokens: 800 };

/// ReACT narrative generation from a case plus the upstream risk analysis.
/// Word-limit and terminology violations fail the invocation.
pub struct NarrativeGeneration<'a> {
    case: &'a CaseData,
    risk_analysis: &'a RiskAnalystOutput,
}

impl<'a> NarrativeGeneration<'a> {
    pub fn new(case: &'a CaseData, risk_analysis: &'a RiskAnalystOutput) -> Self {
        Self { case, risk_analysis }
    }
}

impl AgentContract for NarrativeGeneration<'_> {
    type Output = ComplianceOfficerOutput;

    fn agent_type(&self) -> AgentType {
        AgentType::ComplianceOfficer
    }

    fn action(&self) -> &'static str {
        GENERATE_NARRATIVE_ACTION
    }

    fn case_id(&self) -> &CaseId {
        &self.case.case_id
    }

    fn sampling(&self) -> Sampling {
        NARRATIVE_SAMPLING
    }

    fn compose_prompt(&self) -> Prompt {
        compose_narrative_prompt(self.case, self.risk_analysis)
    }

    fn input_snapshot(&self) -> Value {
        let mut input = Map::new();
        input.insert("case".to_string(), snapshot(self.case));
        input.insert("risk_analysis".to_string(), snapshot(self.risk_analysis));
        Value::Object(input)
    }

    fn validate(
        &self,
        payload: &Map<String, Value>,
    ) -> Result<ComplianceOfficerOutput, PipelineError> {
        validate_narrative_output(payload, &self.case.case_id)
    }

    fn success_note(&self) -> &'static str {
        "ReACT narrative generated and passed compliance checks"
    }

    fn failure_note(&self) -> &'static str {
        "ReACT narrative generation failed"
    }
}

#[derive(Clone)]
pub struct ComplianceOfficerAgent {
    runtime: Arc<AgentRuntime>,
}

impl ComplianceOfficerAgent {
    pub fn new(runtime: Arc<AgentRuntime>) -> Self {
        Self { runtime }
    }

    pub async fn generate_compliance_narrative(
        &self,
        case: &CaseData,
        risk_analysis: &RiskAnalystOutput,
    ) -> Result<ComplianceOfficerOutput, PipelineError> {
        self.runtime.invoke(&NarrativeGeneration::new(case, risk_analysis)).await
    }
}
