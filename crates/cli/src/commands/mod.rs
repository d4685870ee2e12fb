pub mod analyze;
pub mod audit;
pub mod batch;
pub mod config;

use serde::Serialize;
use serde_json::Value;

/// A case ran and was rejected by the pipeline.
pub const EXIT_PIPELINE_FAILURE: u8 = 1;
/// Nothing ran: bad configuration, unreadable input or an unusable runtime.
pub const EXIT_STARTUP_FAILURE: u8 = 2;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::failure_with_data(command, error_class, message, exit_code, None)
    }

    pub fn failure_with_data(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn startup_failure(command: &str, error_class: &str, message: impl Into<String>) -> Self {
        Self::failure(command, error_class, message, EXIT_STARTUP_FAILURE)
    }
}

pub(crate) fn current_thread_runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::startup_failure(
            command,
            "runtime",
            format!("failed to initialize async runtime: {error}"),
        )
    })
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{CommandResult, EXIT_STARTUP_FAILURE};

    fn parse(output: &str) -> Value {
        serde_json::from_str(output).expect("payload should be json")
    }

    #[test]
    fn startup_failures_use_the_documented_exit_code() {
        let result = CommandResult::startup_failure("analyze", "runtime", "no runtime");
        assert_eq!(result.exit_code, EXIT_STARTUP_FAILURE);
        assert_eq!(EXIT_STARTUP_FAILURE, 2);

        let payload = parse(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "runtime");
        assert!(payload.get("data").is_none());
    }

    #[test]
    fn failure_can_carry_partial_results() {
        let result = CommandResult::failure_with_data(
            "batch",
            "batch_partial_failure",
            "1 of 2 cases failed",
            1,
            Some(json!({ "failed": 1 })),
        );

        let payload = parse(&result.output);
        assert_eq!(result.exit_code, 1);
        assert_eq!(payload["data"]["failed"], 1);
    }
}
