use thiserror::Error;

/// Failures reported by a speech recognition backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech recognition is not supported in this environment")]
    Unsupported,
    #[error("speech recognition is already started")]
    AlreadyStarted,
    #[error("speech recognition is not running")]
    NotStarted,
    #[error("speech recognition failed: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("dialogue script not found: {0}")]
    NotFound(String),
    #[error("unable to read dialogue script: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to parse dialogue script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("dialogue script '{0}' has no lines")]
    Empty(String),
}
