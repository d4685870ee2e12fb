use thiserror::Error;

/// Failure to recover a JSON object from raw model text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no JSON content found in model response")]
    Empty,
    #[error("model response is not valid JSON: {source}")]
    Malformed {
        #[source]
        source: serde_json::Error,
    },
    #[error("model response JSON is {found}, expected an object")]
    NotAnObject { found: &'static str },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ComplianceViolation {
    #[error("narrative exceeds {limit}-word limit ({word_count} words)")]
    WordLimitExceeded { word_count: usize, limit: usize },
    #[error("narrative is missing required terms: {}", missing.join(", "))]
    MissingTerms { missing: Vec<String> },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("model transport failed: {0}")]
    Transport(String),
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("schema validation failed: {0}")]
    SchemaValidation(String),
    #[error("compliance check failed: {0}")]
    Compliance(#[from] ComplianceViolation),
}

impl PipelineError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Extraction(_) => "extraction",
            Self::SchemaValidation(_) => "schema_validation",
            Self::Compliance(_) => "compliance",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Transport(_) => "The model service could not be reached. Re-run the case shortly.",
            Self::Extraction(_) | Self::SchemaValidation(_) => {
                "The model response did not match the expected format. Re-run the case."
            }
            Self::Compliance(_) => {
                "The generated narrative did not meet filing requirements. Re-run the case."
            }
        }
    }
}
