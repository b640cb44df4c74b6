//! Wire adapter for the vendor API (`:generateContent`), used by both the
//! direct and bring-your-own-key routes.
//!
//! The request is a single multi-part content array: the text part first,
//! then one inline-data part per primary image, then one per reference
//! image, each tagged with the mime type recovered from its data-URI
//! header. Both text and image modalities are requested. The response's
//! inline blobs are reassembled into data URIs.

use serde::Deserialize;
use serde_json::{json, Value};

use glaze_core::error::CoreError;
use glaze_core::request::{make_data_uri, split_data_uri, GenerationRequest};
use glaze_core::usage::TokenUsage;

use crate::error::GatewayError;

// ---------------------------------------------------------------------------
// Request translation
// ---------------------------------------------------------------------------

/// Build the `:generateContent` request body for a canonical request.
///
/// Fails with [`CoreError::Validation`] if any image is not a base64 data
/// URI, naming the offending index (primaries first, then references).
pub fn build_request(request: &GenerationRequest) -> Result<Value, CoreError> {
    let mut parts = vec![json!({ "text": request.instruction })];

    for (index, uri) in request
        .images
        .iter()
        .chain(request.reference_images.iter())
        .enumerate()
    {
        let (mime, payload) = split_data_uri(uri).ok_or_else(|| {
            CoreError::Validation(format!("image at index {index} is not a base64 data URI"))
        })?;
        parts.push(json!({
            "inlineData": { "mimeType": mime, "data": payload }
        }));
    }

    Ok(json!({
        "contents": [{ "parts": parts }],
        "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
    }))
}

// ---------------------------------------------------------------------------
// Response shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: i64,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: i64,
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Extract images, text, and token usage from a 2xx vendor response.
///
/// Inline blobs become `data:<mime>;base64,<payload>` URIs in candidate
/// order; text parts are concatenated in order.
pub fn parse_response(body: &Value) -> Result<(Vec<String>, String, TokenUsage), GatewayError> {
    let response: GenerateContentResponse = serde_json::from_value(body.clone())
        .map_err(|e| GatewayError::Parse(format!("vendor response: {e}")))?;

    let mut images = Vec::new();
    let mut content = String::new();

    for candidate in &response.candidates {
        let Some(candidate_content) = &candidate.content else {
            continue;
        };
        for part in &candidate_content.parts {
            if let Some(text) = &part.text {
                content.push_str(text);
            }
            if let Some(blob) = &part.inline_data {
                images.push(make_data_uri(&blob.mime_type, &blob.data));
            }
        }
    }

    let usage = response
        .usage_metadata
        .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
        .unwrap_or_default();

    Ok((images, content, usage))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use glaze_core::request::GenerationMode;

    fn request(images: Vec<String>, references: Vec<String>) -> GenerationRequest {
        GenerationRequest {
            instruction: "remove the background".to_string(),
            images,
            reference_images: references,
            model: "gemini-2.5-flash-image-preview".to_string(),
            image_size: None,
            aspect_ratio: None,
            mode: GenerationMode::Batch,
            batch_id: None,
            request_id: None,
        }
    }

    #[test]
    fn text_part_comes_first_then_images_then_references() {
        let req = request(
            vec![make_data_uri("image/png", "AAAA")],
            vec![make_data_uri("image/jpeg", "BBBB")],
        );
        let body = build_request(&req).unwrap();

        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "remove the background");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[2]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(
            body["generationConfig"]["responseModalities"],
            json!(["TEXT", "IMAGE"])
        );
    }

    #[test]
    fn png_data_uri_round_trips_byte_identical_payload() {
        let payload = "iVBORw0KGgoAAAANSUhEUg==";
        let req = request(vec![make_data_uri("image/png", payload)], Vec::new());
        let body = build_request(&req).unwrap();

        let part = &body["contents"][0]["parts"][1]["inlineData"];
        assert_eq!(part["mimeType"], "image/png");
        assert_eq!(part["data"], payload);
    }

    #[test]
    fn non_data_uri_image_is_rejected() {
        let req = request(vec!["https://example.com/cat.png".to_string()], Vec::new());
        assert_matches!(build_request(&req), Err(CoreError::Validation(_)));
    }

    #[test]
    fn parse_reassembles_inline_blobs_into_data_uris() {
        let body = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "here you go" },
                        { "inlineData": { "mimeType": "image/png", "data": "QUJD" } }
                    ]
                }
            }],
            "usageMetadata": {
                "promptTokenCount": 263,
                "candidatesTokenCount": 1290,
                "totalTokenCount": 1553
            }
        });

        let (images, content, usage) = parse_response(&body).unwrap();
        assert_eq!(images, vec!["data:image/png;base64,QUJD".to_string()]);
        assert_eq!(content, "here you go");
        assert_eq!(usage.prompt_tokens, 263);
        assert_eq!(usage.completion_tokens, 1290);
        assert_eq!(usage.total_tokens, 1553);
    }

    #[test]
    fn parse_tolerates_missing_usage_and_empty_candidates() {
        let (images, content, usage) = parse_response(&json!({ "candidates": [] })).unwrap();
        assert!(images.is_empty());
        assert!(content.is_empty());
        assert_eq!(usage, TokenUsage::default());
    }
}
