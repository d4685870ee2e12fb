use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sarpipe_core::audit::read_jsonl_entries;
use sarpipe_core::config::{AppConfig, LoadOptions};
use sarpipe_core::AuditLogEntry;
use serde::Serialize;

use crate::commands::CommandResult;

const COMMAND: &str = "audit";

#[derive(Debug, Default, Serialize)]
struct AgentSummary {
    invocations: usize,
    succeeded: usize,
    failed: usize,
    max_execution_time_ms: u64,
}

#[derive(Debug, Serialize)]
struct AuditSummary {
    path: String,
    entries: usize,
    succeeded: usize,
    failed: usize,
    by_agent: BTreeMap<String, AgentSummary>,
    recent_failures: Vec<FailureLine>,
}

#[derive(Debug, Serialize)]
struct FailureLine {
    case_id: String,
    agent_type: String,
    error_message: String,
}

const RECENT_FAILURE_LIMIT: usize = 5;

pub fn run(path: Option<&Path>) -> CommandResult {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match configured_path() {
            Ok(path) => path,
            Err(message) => return CommandResult::startup_failure(COMMAND, "config_validation", message),
        },
    };

    let entries = match read_jsonl_entries(&path) {
        Ok(entries) => entries,
        Err(error) => {
            return CommandResult::startup_failure(COMMAND, "audit_read", error.to_string())
        }
    };

    let summary = summarize(&path, &entries);
    let message = format!(
        "{} entries ({} succeeded, {} failed)",
        summary.entries, summary.succeeded, summary.failed
    );
    CommandResult::success_with_data(COMMAND, message, serde_json::to_value(&summary).ok())
}

fn configured_path() -> Result<PathBuf, String> {
    AppConfig::load(LoadOptions::default())
        .map(|config| config.audit.path)
        .map_err(|error| error.to_string())
}

fn summarize(path: &Path, entries: &[AuditLogEntry]) -> AuditSummary {
    let mut by_agent: BTreeMap<String, AgentSummary> = BTreeMap::new();
    for entry in entries {
        let agent = by_agent.entry(entry.agent_type.to_string()).or_default();
        agent.invocations += 1;
        if entry.success {
            agent.succeeded += 1;
        } else {
            agent.failed += 1;
        }
        agent.max_execution_time_ms = agent.max_execution_time_ms.max(entry.execution_time_ms);
    }

    let recent_failures = entries
        .iter()
        .rev()
        .filter(|entry| !entry.success)
        .take(RECENT_FAILURE_LIMIT)
        .map(|entry| FailureLine {
            case_id: entry.case_id.clone(),
            agent_type: entry.agent_type.to_string(),
            error_message: entry.error_message.clone().unwrap_or_default(),
        })
        .collect();

    let succeeded = entries.iter().filter(|entry| entry.success).count();
    AuditSummary {
        path: path.display().to_string(),
        entries: entries.len(),
        succeeded,
        failed: entries.len() - succeeded,
        by_agent,
        recent_failures,
    }
}
