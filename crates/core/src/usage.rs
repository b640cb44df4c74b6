//! Token accounting and job-event classification.
//!
//! Every accepted request ends in exactly one job event; the billing math
//! here decides how many tokens it costs.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::routing::ProviderKind;

// ---------------------------------------------------------------------------
// Token usage
// ---------------------------------------------------------------------------

/// Provider-reported token counts, normalized across families.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: i64, completion_tokens: i64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Tokens to charge against the service balance for one generation.
///
/// - BYO requests cost zero: the caller paid the vendor with their own key.
/// - Otherwise the reported prompt + completion count is charged, floored
///   at `fallback_cost` so an incomplete or under-reporting provider
///   response never turns into unmetered work.
pub fn tokens_charged(kind: ProviderKind, usage: &TokenUsage, fallback_cost: i64) -> i64 {
    if kind == ProviderKind::BringYourOwnKey {
        return 0;
    }
    let reported = usage.prompt_tokens + usage.completion_tokens;
    reported.max(fallback_cost)
}

// ---------------------------------------------------------------------------
// Job status
// ---------------------------------------------------------------------------

/// Outcome class of one generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Upstream 2xx with at least one image.
    Success,
    /// Upstream 2xx, no images, but non-empty text. Billed and logged, not
    /// an error: the call did real work, it just produced no visual artifact.
    Warning,
    /// Anything else.
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Success => "success",
            JobStatus::Warning => "warning",
            JobStatus::Error => "error",
        }
    }
}

/// Classify a 2xx upstream outcome from its outputs.
pub fn classify_success(image_count: usize, content: &str) -> JobStatus {
    if image_count > 0 {
        JobStatus::Success
    } else if !content.trim().is_empty() {
        JobStatus::Warning
    } else {
        JobStatus::Error
    }
}

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

/// Stable machine-readable codes recorded on failed job events and returned
/// in error envelopes.
pub mod error_code {
    pub const VALIDATION: &str = "VALIDATION_ERROR";
    pub const PAYLOAD_TOO_LARGE: &str = "PAYLOAD_TOO_LARGE";
    pub const MISSING_CREDENTIAL: &str = "MISSING_CREDENTIAL";
    pub const INSUFFICIENT_BALANCE: &str = "INSUFFICIENT_BALANCE";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const CONFIGURATION: &str = "CONFIGURATION_ERROR";
    pub const AUTH_REJECTED: &str = "UPSTREAM_AUTH_REJECTED";
    pub const RESTRICTED_FREE_TIER: &str = "RESTRICTED_FREE_TIER";
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    pub const UPSTREAM: &str = "UPSTREAM_ERROR";
    pub const NO_OUTPUT: &str = "NO_OUTPUT";
    pub const INTERNAL: &str = "INTERNAL_ERROR";
}

/// Error code for a [`CoreError`], used when recording failed attempts.
pub fn core_error_code(err: &CoreError) -> &'static str {
    match err {
        CoreError::Validation(_) => error_code::VALIDATION,
        CoreError::PayloadTooLarge { .. } => error_code::PAYLOAD_TOO_LARGE,
        CoreError::MissingCredential(_) => error_code::MISSING_CREDENTIAL,
        CoreError::InsufficientBalance { .. } => error_code::INSUFFICIENT_BALANCE,
        CoreError::Unauthorized(_) => error_code::UNAUTHORIZED,
        CoreError::Forbidden(_) => error_code::FORBIDDEN,
        CoreError::Configuration(_) => error_code::CONFIGURATION,
        CoreError::Internal(_) => error_code::INTERNAL,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
