use std::sync::Arc;
use std::time::Instant;

use sarpipe_core::{
    AgentType, AuditLogEntry, AuditSink, CaseId, InvocationRecord, PipelineError,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::extract::extract_payload;
use crate::llm::{LlmClient, LlmRequest};
use crate::prompt::Prompt;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Everything that distinguishes one agent from another: its prompt, its
/// output schema and the domain rules applied to that output.
pub trait AgentContract: Send + Sync {
    type Output: Serialize + Send;

    fn agent_type(&self) -> AgentType;
    fn action(&self) -> &'static str;
    fn case_id(&self) -> &CaseId;
    fn sampling(&self) -> Sampling;
    fn compose_prompt(&self) -> Prompt;
    fn input_snapshot(&self) -> Value;
    fn validate(&self, payload: &Map<String, Value>) -> Result<Self::Output, PipelineError>;
    fn success_note(&self) -> &'static str;
    fn failure_note(&self) -> &'static str;
}

/// Last stage an invocation completed before it finished or failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvocationStage {
    Start,
    PromptBuilt,
    ModelCalled,
    Extracted,
    Validated,
}

impl InvocationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::PromptBuilt => "prompt_built",
            Self::ModelCalled => "model_called",
            Self::Extracted => "extracted",
            Self::Validated => "validated",
        }
    }
}

/// Runs one agent contract through compose, model call, extraction and
/// validation, and records exactly one audit entry whatever the outcome.
/// There are no retries; a failure is audited and handed back.
pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    audit: Arc<dyn AuditSink>,
    model: String,
}

impl AgentRuntime {
    pub fn new(llm: Arc<dyn LlmClient>, audit: Arc<dyn AuditSink>, model: impl Into<String>) -> Self {
        Self { llm, audit, model: model.into() }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn invoke<C>(&self, contract: &C) -> Result<C::Output, PipelineError>
    where
        C: AgentContract,
    {
        let started = Instant::now();
        let mut stage = InvocationStage::Start;
        info!(
            event_name = "agent.invocation.started",
            agent_type = %contract.agent_type(),
            action = contract.action(),
            case_id = %contract.case_id(),
            model = %self.model,
            "agent invocation started"
        );

        let result = self.run_stages(contract, &mut stage).await;
        let input_data = contract.input_snapshot();
        let invocation = InvocationRecord {
            agent_type: contract.agent_type(),
            action: contract.action().to_string(),
            case_id: contract.case_id().to_string(),
            input_data,
            execution_time_ms: elapsed_ms(started),
        };

        match result {
            Ok(output) => {
                let output_data = snapshot(&output);
                let execution_time_ms = invocation.execution_time_ms;
                self.audit.record(AuditLogEntry::succeeded(
                    invocation,
                    output_data,
                    contract.success_note(),
                ));
                info!(
                    event_name = "agent.invocation.succeeded",
                    agent_type = %contract.agent_type(),
                    case_id = %contract.case_id(),
                    execution_time_ms,
                    "agent invocation succeeded"
                );
                Ok(output)
            }
            Err(error) => {
                let execution_time_ms = invocation.execution_time_ms;
                self.audit.record(AuditLogEntry::failed(
                    invocation,
                    format!("{} after {}", contract.failure_note(), stage.as_str()),
                    error.to_string(),
                ));
                warn!(
                    event_name = "agent.invocation.failed",
                    agent_type = %contract.agent_type(),
                    case_id = %contract.case_id(),
                    stage = stage.as_str(),
                    error_class = error.error_class(),
                    error = %error,
                    execution_time_ms,
                    "agent invocation failed"
                );
                Err(error)
            }
        }
    }

    async fn run_stages<C>(
        &self,
        contract: &C,
        stage: &mut InvocationStage,
    ) -> Result<C::Output, PipelineError>
    where
        C: AgentContract,
    {
        let prompt = contract.compose_prompt();
        *stage = InvocationStage::PromptBuilt;

        let sampling = contract.sampling();
        let request = LlmRequest {
            model: self.model.clone(),
            system: prompt.system,
            user: prompt.user,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        };
        let raw = self
            .llm
            .complete(&request)
            .await
            .map_err(|error| PipelineError::Transport(format!("{error:#}")))?;
        *stage = InvocationStage::ModelCalled;

        let payload = extract_payload(&raw)?;
        *stage = InvocationStage::Extracted;

        let output = contract.validate(&payload)?;
        *stage = InvocationStage::Validated;

        Ok(output)
    }
}

pub(crate) fn snapshot<T>(value: &T) -> Value
where
    T: Serialize + ?Sized,
{
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
