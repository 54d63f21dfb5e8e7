//! Error types module
//!
//! All failures surfaced by the upload engine are unified under `UploadError`.
//! Storage drivers keep their own error type and are converted at the
//! pipeline boundary into `Transfer` or `Credential`.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
///
/// The HTTP layer in front of the engine uses this to render errors without
/// matching on every variant itself.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "TRANSFER_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to issue upload credential: {0}")]
    Credential(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("{event} hook failed: {source}")]
    Hook {
        event: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UploadError {
    /// Wrap an arbitrary hook failure, keeping typed engine errors as they are.
    pub fn from_hook(event: &'static str, err: anyhow::Error) -> Self {
        match err.downcast::<UploadError>() {
            Ok(typed) => typed,
            Err(source) => UploadError::Hook { event, source },
        }
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            UploadError::Config(_) => "CONFIG_ERROR",
            UploadError::Credential(_) => "CREDENTIAL_ERROR",
            UploadError::Cache(_) => "CACHE_ERROR",
            UploadError::Hook { .. } => "HOOK_ERROR",
            UploadError::Transfer(_) => "TRANSFER_ERROR",
            UploadError::InvalidInput(_) => "INVALID_INPUT",
            UploadError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            UploadError::Credential(_) | UploadError::Cache(_) | UploadError::Transfer(_)
        )
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::Config(_) => "Upload settings are misconfigured".to_string(),
            UploadError::Credential(_) => "Unable to obtain upload credential".to_string(),
            UploadError::Cache(_) => "Unable to create upload session".to_string(),
            UploadError::Hook { source, .. } => source.to_string(),
            UploadError::Transfer(_) => "Failed to store file".to_string(),
            UploadError::InvalidInput(msg) => msg.clone(),
            UploadError::Internal(_) => "Internal server error".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            UploadError::InvalidInput(_) | UploadError::Hook { .. } => LogLevel::Debug,
            UploadError::Transfer(_) | UploadError::Credential(_) => LogLevel::Warn,
            UploadError::Config(_) | UploadError::Cache(_) | UploadError::Internal(_) => {
                LogLevel::Error
            }
        }
    }
}
