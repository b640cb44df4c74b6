//! Gateway error taxonomy and upstream outcome classification.

use glaze_core::error::CoreError;

/// Upstream error bodies are truncated to this many characters before being
/// logged or carried in an error variant.
pub const MAX_ERROR_BODY_CHARS: usize = 512;

/// Substring in a 403 body that marks the vendor's restricted free tier
/// rather than a bad credential. Matched case-insensitively.
const RESTRICTED_MARKER: &str = "free tier";

/// Errors produced while dispatching one request upstream.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request could not be translated to the provider's wire format.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// Upstream returned 403. `restricted` distinguishes the vendor's
    /// free-tier restriction from a generic credential failure.
    #[error("Upstream rejected the credential (restricted: {restricted})")]
    AuthRejected { restricted: bool },

    /// Upstream returned 429.
    #[error("Upstream rate limit exceeded")]
    RateLimited,

    /// Any other non-2xx upstream status, with the truncated error body.
    #[error("Upstream returned HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// The HTTP request itself failed (network, DNS, TLS).
    #[error("Upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream returned 2xx but the body did not match the expected shape.
    #[error("Failed to parse upstream response: {0}")]
    Parse(String),
}

/// Classify a non-2xx upstream status into a [`GatewayError`].
pub fn classify_status(status: u16, body: &str) -> GatewayError {
    match status {
        403 => GatewayError::AuthRejected {
            restricted: body.to_lowercase().contains(RESTRICTED_MARKER),
        },
        429 => GatewayError::RateLimited,
        _ => GatewayError::UpstreamStatus {
            status,
            body: truncate_body(body),
        },
    }
}

/// Truncate an error body to [`MAX_ERROR_BODY_CHARS`] on a char boundary.
pub fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn forbidden_with_marker_is_restricted() {
        let err = classify_status(403, "Image generation is not available on the Free Tier.");
        assert_matches!(err, GatewayError::AuthRejected { restricted: true });
    }

    #[test]
    fn forbidden_without_marker_is_generic() {
        let err = classify_status(403, "invalid api key");
        assert_matches!(err, GatewayError::AuthRejected { restricted: false });
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        assert_matches!(classify_status(429, ""), GatewayError::RateLimited);
    }

    #[test]
    fn other_statuses_carry_status_and_truncated_body() {
        let long_body = "x".repeat(2000);
        let err = classify_status(502, &long_body);
        match err {
            GatewayError::UpstreamStatus { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body.len(), MAX_ERROR_BODY_CHARS);
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
