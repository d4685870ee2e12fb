use std::path::PathBuf;
use std::sync::Arc;

use sarpipe_agent::{BatchItem, LlmClient};
use sarpipe_core::config::AppConfig;
use serde_json::{json, Value};

use crate::commands::analyze::{build_workflow, load_case, prepare, to_data};
use crate::commands::{current_thread_runtime, CommandResult, EXIT_PIPELINE_FAILURE};

const COMMAND: &str = "batch";

pub fn run(case_paths: &[PathBuf]) -> CommandResult {
    let (config, llm) = match prepare(COMMAND) {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    run_with_client(&config, case_paths, llm)
}

/// Runs the full workflow for every case file, at most
/// `pipeline.batch_concurrency` cases at a time. Every file is parsed before
/// any model call is made.
pub fn run_with_client(
    config: &AppConfig,
    case_paths: &[PathBuf],
    llm: Arc<dyn LlmClient>,
) -> CommandResult {
    if case_paths.is_empty() {
        return CommandResult::startup_failure(COMMAND, "case_input", "no case files given");
    }

    let mut cases = Vec::with_capacity(case_paths.len());
    for path in case_paths {
        match load_case(path) {
            Ok(case) => cases.push(case),
            Err(error) => {
                return CommandResult::startup_failure(COMMAND, "case_input", format!("{error:#}"))
            }
        }
    }

    let workflow = match build_workflow(COMMAND, config, llm) {
        Ok(workflow) => Arc::new(workflow),
        Err(failure) => return failure,
    };

    let runtime = match current_thread_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let concurrency = config.pipeline.batch_concurrency;
    let items = runtime.block_on(workflow.process_batch(cases, concurrency));

    let failed = items.iter().filter(|item| item.result.is_err()).count();
    let total = items.len();
    let data = json!({
        "concurrency": concurrency,
        "succeeded": total - failed,
        "failed": failed,
        "cases": items.iter().map(item_summary).collect::<Vec<_>>(),
    });

    if failed == 0 {
        CommandResult::success_with_data(COMMAND, format!("{total} cases analyzed"), Some(data))
    } else {
        CommandResult::failure_with_data(
            COMMAND,
            "batch_partial_failure",
            format!("{failed} of {total} cases failed"),
            EXIT_PIPELINE_FAILURE,
            Some(data),
        )
    }
}

fn item_summary(item: &BatchItem) -> Value {
    match &item.result {
        Ok(report) => json!({
            "case_id": item.case_id,
            "status": "ok",
            "report": to_data(report),
        }),
        Err(error) => json!({
            "case_id": item.case_id,
            "status": "error",
            "error_class": error.error_class(),
            "message": error.to_string(),
        }),
    }
}
