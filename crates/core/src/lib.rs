pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;

pub use audit::{
    AgentType, AuditLogEntry, AuditSink, AuditSinkError, InMemoryAuditSink, InvocationRecord,
    JsonlAuditSink,
};
pub use domain::case::{AccountData, CaseData, CaseId, CustomerData, TransactionData};
pub use domain::report::{
    Classification, ComplianceOfficerOutput, RiskAnalystOutput, RiskLevel, NARRATIVE_WORD_LIMIT,
    REASONING_CHAR_LIMIT, REQUIRED_NARRATIVE_TERMS,
};
pub use errors::{ComplianceViolation, ExtractionError, PipelineError};
