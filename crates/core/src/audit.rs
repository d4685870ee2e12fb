use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentType {
    RiskAnalyst,
    ComplianceOfficer,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RiskAnalyst => "RiskAnalyst",
            Self::ComplianceOfficer => "ComplianceOfficer",
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields shared by every entry regardless of outcome.
#[derive(Clone, Debug, PartialEq)]
pub struct InvocationRecord {
    pub agent_type: AgentType,
    pub action: String,
    pub case_id: String,
    pub input_data: Value,
    pub execution_time_ms: u64,
}

/// One immutable record per agent invocation.
///
/// Constructed only through [`AuditLogEntry::succeeded`] or
/// [`AuditLogEntry::failed`], which keeps `error_message` present exactly
/// when `success` is false.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub entry_id: String,
    pub recorded_at: DateTime<Utc>,
    pub agent_type: AgentType,
    pub action: String,
    pub case_id: String,
    pub input_data: Value,
    pub output_data: Value,
    pub reasoning: String,
    pub execution_time_ms: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AuditLogEntry {
    pub fn succeeded(
        invocation: InvocationRecord,
        output_data: Value,
        reasoning: impl Into<String>,
    ) -> Self {
        Self::build(invocation, output_data, reasoning.into(), None)
    }

    pub fn failed(
        invocation: InvocationRecord,
        reasoning: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        let error_message = error_message.into();
        let error_message = if error_message.trim().is_empty() {
            "unspecified failure".to_string()
        } else {
            error_message
        };
        Self::build(invocation, Value::Object(Map::new()), reasoning.into(), Some(error_message))
    }

    fn build(
        invocation: InvocationRecord,
        output_data: Value,
        reasoning: String,
        error_message: Option<String>,
    ) -> Self {
        Self {
            entry_id: Uuid::new_v4().to_string(),
            recorded_at: Utc::now(),
            agent_type: invocation.agent_type,
            action: invocation.action,
            case_id: invocation.case_id,
            input_data: invocation.input_data,
            output_data,
            reasoning,
            execution_time_ms: invocation.execution_time_ms,
            success: error_message.is_none(),
            error_message,
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditLogEntry);
}

#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    entries: Arc<Mutex<Vec<AuditLogEntry>>>,
}

impl InMemoryAuditSink {
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, entry: AuditLogEntry) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuditSinkError {
    #[error("could not open audit log `{path}`: {source}")]
    Open { path: PathBuf, source: std::io::Error },
    #[error("could not read audit log `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("audit log `{path}` line {line} is not a valid entry: {source}")]
    Decode { path: PathBuf, line: usize, source: serde_json::Error },
}

/// Append-only JSON-lines audit file, one entry per line.
///
/// The file is opened once; an unopenable path is reported by [`open`](Self::open)
/// so it surfaces at startup. Later write failures cannot be returned to the
/// pipeline and are reported through `tracing`.
///
/// `record` writes and flushes synchronously while holding a `std::sync::Mutex`,
/// so it blocks the calling task for one small append. Concurrent batch tasks
/// serialise on that lock and each line lands whole. A sink for high-volume
/// async callers would move the write onto `spawn_blocking` or a writer task.
pub struct JsonlAuditSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlAuditSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditSinkError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|source| AuditSinkError::Open { path: path.clone(), source })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditSinkError::Open { path: path.clone(), source })?;

        Ok(Self { path, file: Mutex::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(file: &mut File, line: &str) -> std::io::Result<()> {
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()
    }
}

impl AuditSink for JsonlAuditSink {
    fn record(&self, entry: AuditLogEntry) {
        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(error) => {
                tracing::error!(
                    event_name = "audit.sink.encode_failed",
                    entry_id = %entry.entry_id,
                    case_id = %entry.case_id,
                    error = %error,
                    "audit entry could not be encoded"
                );
                return;
            }
        };

        let result = match self.file.lock() {
            Ok(mut file) => Self::write_line(&mut file, &line),
            Err(poisoned) => Self::write_line(&mut poisoned.into_inner(), &line),
        };

        if let Err(error) = result {
            tracing::error!(
                event_name = "audit.sink.write_failed",
                path = %self.path.display(),
                entry_id = %entry.entry_id,
                case_id = %entry.case_id,
                error = %error,
                "audit entry could not be persisted"
            );
        }
    }
}

pub fn read_jsonl_entries(path: impl AsRef<Path>) -> Result<Vec<AuditLogEntry>, AuditSinkError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|source| AuditSinkError::Read { path: path.to_path_buf(), source })?;

    let mut entries = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line =
            line.map_err(|source| AuditSinkError::Read { path: path.to_path_buf(), source })?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = serde_json::from_str(&line).map_err(|source| AuditSinkError::Decode {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        entries.push(entry);
    }
    Ok(entries)
}
