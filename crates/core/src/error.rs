use crate::types::UserId;

/// Domain error taxonomy shared by every crate in the workspace.
///
/// The API crate maps each variant onto an HTTP status; see
/// `glaze-api/src/error.rs`. Variants that carry a [`UserId`] do so for
/// structured logging, never for the response body.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Image at index {index} is too large: {bytes} bytes (max {max})")]
    PayloadTooLarge { index: usize, bytes: u64, max: u64 },

    #[error("No gateway credential stored for user {0}")]
    MissingCredential(UserId),

    #[error("Insufficient balance: {balance} tokens (minimum {required})")]
    InsufficientBalance { balance: i64, required: i64 },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Service misconfigured: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
