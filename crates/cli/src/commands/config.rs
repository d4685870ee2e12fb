use std::env;
use std::fs;
use std::path::Path;

use sarpipe_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let llm_api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };
    let audit_path = config.audit.path.display().to_string();

    let lines = [
        "effective config (source precedence: env > file > default):".to_string(),
        render_line(
            "llm.provider",
            &format!("{:?}", config.llm.provider),
            source("llm.provider", &["SARPIPE_LLM_PROVIDER"]),
        ),
        render_line("llm.model", &config.llm.model, source("llm.model", &["SARPIPE_LLM_MODEL"])),
        render_line(
            "llm.base_url",
            &config.llm.base_url,
            source("llm.base_url", &["SARPIPE_LLM_BASE_URL"]),
        ),
        render_line(
            "llm.api_key",
            llm_api_key,
            source("llm.api_key", &["SARPIPE_LLM_API_KEY", "OPENAI_API_KEY"]),
        ),
        render_line(
            "llm.timeout_secs",
            &config.llm.timeout_secs.to_string(),
            source("llm.timeout_secs", &["SARPIPE_LLM_TIMEOUT_SECS"]),
        ),
        render_line("audit.path", &audit_path, source("audit.path", &["SARPIPE_AUDIT_PATH"])),
        render_line(
            "pipeline.batch_concurrency",
            &config.pipeline.batch_concurrency.to_string(),
            source("pipeline.batch_concurrency", &["SARPIPE_PIPELINE_BATCH_CONCURRENCY"]),
        ),
        render_line(
            "logging.level",
            &config.logging.level,
            source("logging.level", &["SARPIPE_LOGGING_LEVEL", "SARPIPE_LOG_LEVEL"]),
        ),
        render_line(
            "logging.format",
            &format!("{:?}", config.logging.format),
            source("logging.format", &["SARPIPE_LOGGING_FORMAT", "SARPIPE_LOG_FORMAT"]),
        ),
    ];

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
