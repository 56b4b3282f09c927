//! Error type shared by every stage of the pipeline.

use thiserror::Error;

/// Result alias defaulting to [`LexiconError`].
pub type Result<T, E = LexiconError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum LexiconError {
    /// Input could not be read as UTF-8 text or contains a malformed line.
    #[error("invalid input {source_name}: {reason}")]
    InvalidInput { source_name: String, reason: String },

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// Zero usable words after normalization.
    #[error("corpus contains no words")]
    EmptyCorpus,

    #[error("unknown parameter: {name}")]
    UnknownParameter { name: String },

    #[error("invalid value {value:?} for parameter {name}: {reason}")]
    InvalidParameterValue {
        name: String,
        value: String,
        reason: String,
    },

    /// A structure was requested but its prerequisite input is missing.
    #[error("{structure} is unavailable: pipeline has not run")]
    PipelineNotRun { structure: &'static str },

    #[error("background worker panicked: {0}")]
    WorkerPanicked(String),
}

impl LexiconError {
    pub(crate) fn invalid_input(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the input file rather than the configuration.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::Io(_) | Self::EmptyCorpus
        )
    }
}
