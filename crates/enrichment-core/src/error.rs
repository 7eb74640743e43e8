use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnrichmentError {
    /// Network failure or non-success HTTP status from a provider.
    #[error("{source_name} unavailable: {message}")]
    SourceUnavailable {
        source_name: &'static str,
        message: String,
    },

    /// Provider answered with a success status but the body was not usable.
    #[error("{source_name} returned a malformed response: {message}")]
    MalformedResponse {
        source_name: &'static str,
        message: String,
    },

    #[error("API keys not configured. Please set {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),
}

impl EnrichmentError {
    pub fn unavailable(source_name: &'static str, message: impl Into<String>) -> Self {
        EnrichmentError::SourceUnavailable {
            source_name,
            message: message.into(),
        }
    }

    pub fn malformed(source_name: &'static str, message: impl Into<String>) -> Self {
        EnrichmentError::MalformedResponse {
            source_name,
            message: message.into(),
        }
    }

    /// Both source-level variants are recovered the same way by the orchestrator.
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            EnrichmentError::SourceUnavailable { .. } | EnrichmentError::MalformedResponse { .. }
        )
    }
}

pub type EnrichmentResult<T> = Result<T, EnrichmentError>;
