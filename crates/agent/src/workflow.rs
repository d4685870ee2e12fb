use std::sync::Arc;

use sarpipe_core::{CaseData, CaseId, ComplianceOfficerOutput, PipelineError, RiskAnalystOutput};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::compliance_officer::ComplianceOfficerAgent;
use crate::risk_analyst::RiskAnalystAgent;
use crate::runtime::AgentRuntime;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SarReport {
    pub case_id: CaseId,
    pub risk_analysis: RiskAnalystOutput,
    pub narrative: ComplianceOfficerOutput,
}

#[derive(Debug)]
pub struct BatchItem {
    pub case_id: CaseId,
    pub result: Result<SarReport, PipelineError>,
}

/// Risk analysis followed by narrative generation for the same case. Each
/// stage audits itself, so a stage error is returned as-is.
#[derive(Clone)]
pub struct SarWorkflow {
    risk_analyst: RiskAnalystAgent,
    compliance_officer: ComplianceOfficerAgent,
}

impl SarWorkflow {
    pub fn new(runtime: Arc<AgentRuntime>) -> Self {
        Self {
            risk_analyst: RiskAnalystAgent::new(runtime.clone()),
            compliance_officer: ComplianceOfficerAgent::new(runtime),
        }
    }

    pub fn risk_analyst(&self) -> &RiskAnalystAgent {
        &self.risk_analyst
    }

    pub fn compliance_officer(&self) -> &ComplianceOfficerAgent {
        &self.compliance_officer
    }

    pub async fn run(&self, case: &CaseData) -> Result<SarReport, PipelineError> {
        let risk_analysis = self.risk_analyst.analyze_case(case).await?;
        let narrative =
            self.compliance_officer.generate_compliance_narrative(case, &risk_analysis).await?;

        Ok(SarReport { case_id: case.case_id.clone(), risk_analysis, narrative })
    }

    /// Processes independent cases concurrently, at most `concurrency` at a
    /// time. Results come back in input order.
    pub async fn process_batch(
        self: Arc<Self>,
        cases: Vec<CaseData>,
        concurrency: usize,
    ) -> Vec<BatchItem> {
        let permits = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let total = cases.len();
        info!(event_name = "workflow.batch.started", cases = total, concurrency, "batch started");

        for (index, case) in cases.into_iter().enumerate() {
            let workflow = Arc::clone(&self);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let result = workflow.run(&case).await;
                (index, BatchItem { case_id: case.case_id, result })
            });
        }

        let mut slots = (0..total).map(|_| None).collect::<Vec<Option<BatchItem>>>();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, item)) => slots[index] = Some(item),
                Err(join_error) if join_error.is_panic() => {
                    std::panic::resume_unwind(join_error.into_panic())
                }
                Err(join_error) => {
                    error!(
                        event_name = "workflow.batch.task_cancelled",
                        error = %join_error,
                        "batch task ended without a result"
                    );
                }
            }
        }

        let items = slots.into_iter().flatten().collect::<Vec<_>>();
        let failed = items.iter().filter(|item| item.result.is_err()).count();
        info!(
            event_name = "workflow.batch.completed",
            cases = total,
            failed,
            "batch completed"
        );
        items
    }
}
