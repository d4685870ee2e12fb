use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use sarpipe_agent::{AgentRuntime, LlmClient, OpenAiCompatibleClient, SarWorkflow};
use sarpipe_core::config::{AppConfig, LoadOptions};
use sarpipe_core::{CaseData, JsonlAuditSink};
use serde_json::Value;

use crate::commands::{current_thread_runtime, CommandResult, EXIT_PIPELINE_FAILURE};
use crate::logging::init_logging;

const COMMAND: &str = "analyze";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AnalyzeStage {
    Risk,
    Full,
}

pub fn run(case_path: &Path, stage: AnalyzeStage) -> CommandResult {
    let (config, llm) = match prepare(COMMAND) {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    run_with_client(&config, case_path, stage, llm)
}

pub fn run_with_client(
    config: &AppConfig,
    case_path: &Path,
    stage: AnalyzeStage,
    llm: Arc<dyn LlmClient>,
) -> CommandResult {
    let case = match load_case(case_path) {
        Ok(case) => case,
        Err(error) => return CommandResult::startup_failure(COMMAND, "case_input", format!("{error:#}")),
    };

    let workflow = match build_workflow(COMMAND, config, llm) {
        Ok(workflow) => workflow,
        Err(failure) => return failure,
    };

    let runtime = match current_thread_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let outcome = runtime.block_on(async {
        match stage {
            AnalyzeStage::Risk => {
                workflow.risk_analyst().analyze_case(&case).await.map(|output| to_data(&output))
            }
            AnalyzeStage::Full => workflow.run(&case).await.map(|report| to_data(&report)),
        }
    });

    match outcome {
        Ok(data) => CommandResult::success_with_data(
            COMMAND,
            format!("case `{}` analyzed", case.case_id),
            Some(data),
        ),
        Err(error) => CommandResult::failure(
            COMMAND,
            error.error_class(),
            error.to_string(),
            EXIT_PIPELINE_FAILURE,
        ),
    }
}

/// Loads configuration, installs logging and builds the model client.
pub(crate) fn prepare(command: &str) -> Result<(AppConfig, Arc<dyn LlmClient>), CommandResult> {
    let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::startup_failure(command, "config_validation", error.to_string())
    })?;
    init_logging(&config.logging);

    let llm = OpenAiCompatibleClient::from_config(&config.llm).map_err(|error| {
        CommandResult::startup_failure(command, "llm_client", format!("{error:#}"))
    })?;
    Ok((config, Arc::new(llm)))
}

pub(crate) fn build_workflow(
    command: &str,
    config: &AppConfig,
    llm: Arc<dyn LlmClient>,
) -> Result<SarWorkflow, CommandResult> {
    let sink = JsonlAuditSink::open(&config.audit.path)
        .map_err(|error| CommandResult::startup_failure(command, "audit_sink", error.to_string()))?;
    let runtime = Arc::new(AgentRuntime::new(llm, Arc::new(sink), config.llm.model.clone()));
    Ok(SarWorkflow::new(runtime))
}

pub(crate) fn load_case(path: &Path) -> Result<CaseData> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read case file `{}`", path.display()))?;
    CaseData::from_json_str(&raw)
        .with_context(|| format!("could not parse case file `{}`", path.display()))
}

pub(crate) fn to_data<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
