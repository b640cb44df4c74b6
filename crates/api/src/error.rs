use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use glaze_core::error::CoreError;
use glaze_core::usage::{core_error_code, error_code};
use glaze_gateway::GatewayError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`GatewayError`] for upstream
/// failures, and adds HTTP-specific variants. Implements [`IntoResponse`]
/// to produce consistent `{ "error", "code" }` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `glaze_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An upstream dispatch failure from `glaze_gateway`.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Upstream returned 2xx but produced neither images nor text.
    #[error("Upstream produced no output")]
    NoOutput,

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// HTTP status, stable error code, and user-facing message.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Core(core) => core_parts(core),
            AppError::Gateway(gateway) => gateway_parts(gateway),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::NoOutput => (
                StatusCode::BAD_GATEWAY,
                error_code::NO_OUTPUT,
                "The provider returned neither images nor text".to_string(),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_code::INTERNAL,
                    "An internal error occurred".to_string(),
                )
            }
        }
    }

    /// Error code recorded on the job event for this failure.
    pub fn job_error_code(&self) -> &'static str {
        self.parts().1
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = json!({
            "error": message,
            "code": code,
        });
        (status, axum::Json(body)).into_response()
    }
}

/// Map a [`CoreError`] onto its HTTP representation.
fn core_parts(core: &CoreError) -> (StatusCode, &'static str, String) {
    let status = match core {
        CoreError::Validation(_) | CoreError::PayloadTooLarge { .. } => StatusCode::BAD_REQUEST,
        CoreError::MissingCredential(_) => StatusCode::BAD_REQUEST,
        CoreError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
        CoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
        // Missing service credentials are operator-actionable and fail
        // closed rather than degrading silently.
        CoreError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
        CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %core, "Core error");
    }

    let message = match core {
        // Never leak internals to the client.
        CoreError::Internal(_) => "An internal error occurred".to_string(),
        CoreError::MissingCredential(_) => {
            "No gateway credential stored; add your API key first".to_string()
        }
        other => other.to_string(),
    };

    (status, core_error_code(core), message)
}

/// Map a [`GatewayError`] onto its HTTP representation.
///
/// Unclassified upstream statuses pass through to the client; everything
/// the spec names gets its canonical status.
fn gateway_parts(gateway: &GatewayError) -> (StatusCode, &'static str, String) {
    match gateway {
        GatewayError::Invalid(core) => core_parts(core),
        GatewayError::AuthRejected { restricted: true } => (
            StatusCode::FORBIDDEN,
            error_code::RESTRICTED_FREE_TIER,
            "The upstream provider restricts image generation on this tier".to_string(),
        ),
        GatewayError::AuthRejected { restricted: false } => (
            StatusCode::FORBIDDEN,
            error_code::AUTH_REJECTED,
            "The upstream provider rejected the credential".to_string(),
        ),
        GatewayError::RateLimited => (
            StatusCode::TOO_MANY_REQUESTS,
            error_code::RATE_LIMITED,
            "The upstream provider is rate limiting requests".to_string(),
        ),
        GatewayError::UpstreamStatus { status, body } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            error_code::UPSTREAM,
            format!("Upstream error: {body}"),
        ),
        GatewayError::Request(err) => {
            tracing::error!(error = %err, "Upstream request failed");
            (
                StatusCode::BAD_GATEWAY,
                error_code::UPSTREAM,
                "The upstream provider could not be reached".to_string(),
            )
        }
        GatewayError::Parse(msg) => {
            tracing::error!(error = %msg, "Upstream response parse failed");
            (
                StatusCode::BAD_GATEWAY,
                error_code::UPSTREAM,
                "The upstream provider returned an unexpected response".to_string(),
            )
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`)
///   map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_code::INTERNAL,
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_code::INTERNAL,
                "An internal error occurred".to_string(),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_balance_is_payment_required() {
        let err = AppError::Core(CoreError::InsufficientBalance {
            balance: 100,
            required: 500,
        });
        let (status, code, _) = err.parts();
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(code, error_code::INSUFFICIENT_BALANCE);
    }

    #[test]
    fn restricted_free_tier_gets_distinct_code() {
        let err = AppError::Gateway(GatewayError::AuthRejected { restricted: true });
        let (status, code, _) = err.parts();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(code, error_code::RESTRICTED_FREE_TIER);
    }

    #[test]
    fn rate_limited_maps_to_429() {
        let err = AppError::Gateway(GatewayError::RateLimited);
        assert_eq!(err.parts().0, StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn upstream_status_passes_through() {
        let err = AppError::Gateway(GatewayError::UpstreamStatus {
            status: 418,
            body: "teapot".to_string(),
        });
        assert_eq!(err.parts().0, StatusCode::IM_A_TEAPOT);
    }

    #[test]
    fn missing_service_credential_fails_closed() {
        let err = AppError::Core(CoreError::Configuration("no aggregator key".into()));
        assert_eq!(err.parts().0, StatusCode::SERVICE_UNAVAILABLE);
    }
}
