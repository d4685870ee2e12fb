//! Agent Runtime - LLM-backed risk classification and SAR narrative generation
//!
//! Every agent invocation follows the same constrained cycle:
//! 1. **Prompt Composition** (`prompt`) - render the case into a deterministic prompt
//! 2. **Model Call** (`llm`) - one request to the external model, no retries
//! 3. **Extraction** (`extract`) - recover a JSON object from free-form model text
//! 4. **Validation** (`validate`) - schema checks, then SAR narrative filing rules
//! 5. **Audit** - exactly one `AuditLogEntry` per invocation, success or failure
//!
//! # Key Types
//!
//! - `AgentRuntime` - the shared orchestrator (see `runtime` module)
//! - `AgentContract` - what makes an agent distinct: prompt, schema, domain rules
//! - `RiskAnalystAgent` / `ComplianceOfficerAgent` - the two concrete agents
//! - `SarWorkflow` - both agents in sequence, single case or batch
//!
//! # Safety Principle
//!
//! The model only proposes. A classification or narrative reaches the caller
//! only after it has passed every check; anything else is an audited error.

pub mod compliance_officer;
pub mod extract;
pub mod llm;
pub mod prompt;
pub mod risk_analyst;
pub mod runtime;
pub mod validate;
pub mod workflow;

pub use compliance_officer::{ComplianceOfficerAgent, NarrativeGeneration};
pub use llm::{LlmClient, LlmRequest, OpenAiCompatibleClient};
pub use risk_analyst::{RiskAnalystAgent, RiskClassification};
pub use runtime::{AgentContract, AgentRuntime, InvocationStage, Sampling};
pub use workflow::{BatchItem, SarReport, SarWorkflow};
