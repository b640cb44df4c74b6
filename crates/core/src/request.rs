//! The canonical generation request and its validation rules.
//!
//! A [`GenerationRequest`] is built once by the API layer and owned by the
//! dispatcher for the lifetime of one call. All validation here is pure and
//! takes its limits as parameters; the configured values live in the API
//! crate's `ServerConfig`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Requested output resolution class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Small,
    Medium,
    Large,
}

impl ImageSize {
    /// Wire name used by the aggregator's image configuration object.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Small => "small",
            ImageSize::Medium => "medium",
            ImageSize::Large => "large",
        }
    }
}

/// How the client intends the generation to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    Batch,
    Combine,
    Resize,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Batch => "batch",
            GenerationMode::Combine => "combine",
            GenerationMode::Resize => "resize",
        }
    }
}

/// Aspect ratios the upstream providers accept. Anything else is dropped
/// rather than rejected -- the ratio is a hint, not a contract.
pub const ALLOWED_ASPECT_RATIOS: &[&str] = &[
    "1:1", "2:3", "3:2", "3:4", "4:3", "4:5", "5:4", "9:16", "16:9", "21:9",
];

/// Whether an aspect-ratio string is on the provider allow-list.
pub fn is_allowed_aspect_ratio(ratio: &str) -> bool {
    ALLOWED_ASPECT_RATIOS.contains(&ratio)
}

// ---------------------------------------------------------------------------
// GenerationRequest
// ---------------------------------------------------------------------------

/// Canonical unit of work: one image-generation call, provider-agnostic.
///
/// Immutable once constructed. `images` are the primary inputs being edited;
/// `reference_images` are style/content references. Both are data URIs
/// (`data:<mime>;base64,<payload>`).
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub instruction: String,
    pub images: Vec<String>,
    pub reference_images: Vec<String>,
    pub model: String,
    pub image_size: Option<ImageSize>,
    pub aspect_ratio: Option<String>,
    pub mode: GenerationMode,
    pub batch_id: Option<String>,
    pub request_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject an absent, empty, or over-long instruction.
pub fn validate_instruction(instruction: &str, max_chars: usize) -> Result<(), CoreError> {
    let trimmed = instruction.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "instruction must not be empty".to_string(),
        ));
    }
    let chars = instruction.chars().count();
    if chars > max_chars {
        return Err(CoreError::Validation(format!(
            "instruction is {chars} characters (max {max_chars})"
        )));
    }
    Ok(())
}

/// Estimate the decoded byte size of a base64 payload from its encoded
/// length. Base64 expands 3 bytes into 4 characters, so the reverse is
/// encoded length x 3/4. Padding makes this a slight overestimate, which is
/// the safe direction for a size limit.
pub fn estimated_decoded_bytes(encoded_len: usize) -> u64 {
    (encoded_len as u64 * 3) / 4
}

/// Check every image (primary then reference, in submission order) against
/// the per-image decoded size limit. The size is estimated from the base64
/// payload segment only -- the data-URI header does not count.
pub fn validate_image_sizes(request: &GenerationRequest, max_bytes: u64) -> Result<(), CoreError> {
    for (index, uri) in request
        .images
        .iter()
        .chain(request.reference_images.iter())
        .enumerate()
    {
        let payload_len = match split_data_uri(uri) {
            Some((_, payload)) => payload.len(),
            None => uri.len(),
        };
        let bytes = estimated_decoded_bytes(payload_len);
        if bytes > max_bytes {
            return Err(CoreError::PayloadTooLarge {
                index,
                bytes,
                max: max_bytes,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Data URIs
// ---------------------------------------------------------------------------

/// Split a `data:<mime>;base64,<payload>` URI into `(mime, payload)`.
///
/// Returns `None` if the string is not a base64 data URI.
pub fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    if mime.is_empty() {
        return None;
    }
    Some((mime, payload))
}

/// Reassemble a data URI from a mime type and base64 payload.
pub fn make_data_uri(mime: &str, payload: &str) -> String {
    format!("data:{mime};base64,{payload}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request_with_images(images: Vec<String>) -> GenerationRequest {
        GenerationRequest {
            instruction: "repaint the sky".to_string(),
            images,
            reference_images: Vec::new(),
            model: "test-model".to_string(),
            image_size: None,
            aspect_ratio: None,
            mode: GenerationMode::Batch,
            batch_id: None,
            request_id: None,
        }
    }

    #[test]
    fn instruction_within_limit_passes() {
        assert!(validate_instruction("make it warmer", 10_000).is_ok());
    }

    #[test]
    fn instruction_over_limit_rejected() {
        let long = "x".repeat(10_001);
        assert_matches!(
            validate_instruction(&long, 10_000),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn empty_instruction_rejected() {
        assert_matches!(validate_instruction("   ", 10_000), Err(CoreError::Validation(_)));
    }

    #[test]
    fn decoded_size_is_three_quarters_of_encoded() {
        assert_eq!(estimated_decoded_bytes(4), 3);
        assert_eq!(estimated_decoded_bytes(1000), 750);
        assert_eq!(estimated_decoded_bytes(0), 0);
    }

    #[test]
    fn oversized_image_reports_offending_index() {
        let small = make_data_uri("image/png", &"A".repeat(100));
        let big = make_data_uri("image/png", &"A".repeat(2000));
        let req = request_with_images(vec![small, big]);
        assert_matches!(
            validate_image_sizes(&req, 1000),
            Err(CoreError::PayloadTooLarge { index: 1, .. })
        );
    }

    #[test]
    fn reference_image_indexes_continue_after_primaries() {
        let mut req = request_with_images(vec![make_data_uri("image/png", "AAAA")]);
        req.reference_images = vec![make_data_uri("image/jpeg", &"A".repeat(2000))];
        assert_matches!(
            validate_image_sizes(&req, 1000),
            Err(CoreError::PayloadTooLarge { index: 1, .. })
        );
    }

    #[test]
    fn split_data_uri_recovers_mime_and_payload() {
        let uri = "data:image/png;base64,iVBORw0KGgo=";
        assert_eq!(split_data_uri(uri), Some(("image/png", "iVBORw0KGgo=")));
    }

    #[test]
    fn split_data_uri_rejects_plain_strings() {
        assert_eq!(split_data_uri("https://example.com/cat.png"), None);
        assert_eq!(split_data_uri("data:image/png,notbase64"), None);
    }

    #[test]
    fn aspect_ratio_allow_list() {
        assert!(is_allowed_aspect_ratio("16:9"));
        assert!(!is_allowed_aspect_ratio("7:5"));
    }
}
