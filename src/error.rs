//! Error types for the banking assistant core

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

/// A blocked transfer is a normal decision, not an error. These variants cover
/// input the core refuses to evaluate and commits it refuses to apply.
#[derive(Error, Debug)]
pub enum AssistantError {

    // =============================
    // Core Errors
    // =============================

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Ledger inconsistency: {0}")]
    LedgerInconsistency(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AssistantError {
    /// True for errors caused by the caller's data rather than by the core
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            AssistantError::InvalidInput(_) | AssistantError::InvalidToolInput(_)
        )
    }
}
