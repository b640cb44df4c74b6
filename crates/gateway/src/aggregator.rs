//! Wire adapter for the OpenAI-compatible aggregator (`/chat/completions`).
//!
//! The request is a chat-style user message: one text segment followed by
//! one image-reference segment per primary and reference image. An
//! image-size / aspect-ratio configuration object is attached only when at
//! least one of those fields is recognized from the fixed allow-list.
//! Responses carry images as URL-or-object references on the first choice's
//! message.

use serde::Deserialize;
use serde_json::{json, Value};

use glaze_core::request::{is_allowed_aspect_ratio, GenerationRequest};
use glaze_core::usage::TokenUsage;

use crate::error::GatewayError;

// ---------------------------------------------------------------------------
// Request translation
// ---------------------------------------------------------------------------

/// Build the `/chat/completions` request body for a canonical request.
///
/// Images pass through as-is (the aggregator accepts data URIs and URLs in
/// the same `image_url` segment), so this translation cannot fail.
pub fn build_request(request: &GenerationRequest, model: &str) -> Value {
    let mut content = vec![json!({ "type": "text", "text": request.instruction })];

    for uri in request.images.iter().chain(request.reference_images.iter()) {
        content.push(json!({
            "type": "image_url",
            "image_url": { "url": uri }
        }));
    }

    let mut body = json!({
        "model": model,
        "messages": [{ "role": "user", "content": content }]
    });

    if let Some(config) = image_config(request) {
        body["image_config"] = config;
    }

    body
}

/// The optional image configuration object: present only when the request
/// carries a size class or an allow-listed aspect ratio.
fn image_config(request: &GenerationRequest) -> Option<Value> {
    let mut config = serde_json::Map::new();

    if let Some(size) = request.image_size {
        config.insert("image_size".to_string(), json!(size.as_str()));
    }
    if let Some(ratio) = &request.aspect_ratio {
        if is_allowed_aspect_ratio(ratio) {
            config.insert("aspect_ratio".to_string(), json!(ratio));
        }
    }

    if config.is_empty() {
        None
    } else {
        Some(Value::Object(config))
    }
}

// ---------------------------------------------------------------------------
// Response shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
    #[serde(default)]
    images: Vec<ImageRef>,
}

/// Aggregators emit image references either as bare URL strings or as
/// `{ "image_url": { "url": ... } }` objects, depending on the upstream.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageRef {
    Url(String),
    Object { image_url: ImageUrl },
}

#[derive(Debug, Deserialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: i64,
    #[serde(default)]
    completion_tokens: i64,
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Extract images, text, and token usage from a 2xx aggregator response.
pub fn parse_response(body: &Value) -> Result<(Vec<String>, String, TokenUsage), GatewayError> {
    let response: ChatCompletionResponse = serde_json::from_value(body.clone())
        .map_err(|e| GatewayError::Parse(format!("aggregator response: {e}")))?;

    let mut images = Vec::new();
    let mut content = String::new();

    for choice in &response.choices {
        if let Some(text) = &choice.message.content {
            content.push_str(text);
        }
        for image in &choice.message.images {
            match image {
                ImageRef::Url(url) => images.push(url.clone()),
                ImageRef::Object { image_url } => images.push(image_url.url.clone()),
            }
        }
    }

    let usage = response
        .usage
        .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();

    Ok((images, content, usage))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use glaze_core::request::{GenerationMode, ImageSize};

    fn request() -> GenerationRequest {
        GenerationRequest {
            instruction: "add a red scarf".to_string(),
            images: vec!["data:image/png;base64,QUJD".to_string()],
            reference_images: vec!["data:image/webp;base64,REVG".to_string()],
            model: "aggregator-default".to_string(),
            image_size: None,
            aspect_ratio: None,
            mode: GenerationMode::Combine,
            batch_id: None,
            request_id: None,
        }
    }

    #[test]
    fn message_has_text_then_one_segment_per_image() {
        let body = build_request(&request(), "aggregator-default");
        let content = &body["messages"][0]["content"];

        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], "data:image/png;base64,QUJD");
        assert_eq!(content[2]["image_url"]["url"], "data:image/webp;base64,REVG");
        assert_eq!(body["model"], "aggregator-default");
    }

    #[test]
    fn image_config_absent_without_recognized_fields() {
        let mut req = request();
        req.aspect_ratio = Some("7:5".to_string()); // not on the allow-list
        let body = build_request(&req, "m");
        assert!(body.get("image_config").is_none());
    }

    #[test]
    fn image_config_present_with_size_or_ratio() {
        let mut req = request();
        req.image_size = Some(ImageSize::Large);
        req.aspect_ratio = Some("16:9".to_string());
        let body = build_request(&req, "m");

        assert_eq!(body["image_config"]["image_size"], "large");
        assert_eq!(body["image_config"]["aspect_ratio"], "16:9");
    }

    #[test]
    fn parse_collects_url_and_object_image_refs() {
        let body = json!({
            "choices": [{
                "message": {
                    "content": "done",
                    "images": [
                        "https://cdn.example.com/a.png",
                        { "image_url": { "url": "https://cdn.example.com/b.png" } }
                    ]
                }
            }],
            "usage": { "prompt_tokens": 120, "completion_tokens": 800 }
        });

        let (images, content, usage) = parse_response(&body).unwrap();
        assert_eq!(
            images,
            vec![
                "https://cdn.example.com/a.png".to_string(),
                "https://cdn.example.com/b.png".to_string()
            ]
        );
        assert_eq!(content, "done");
        assert_eq!(usage.total_tokens, 920);
    }

    #[test]
    fn parse_tolerates_missing_images_and_usage() {
        let body = json!({
            "choices": [{ "message": { "content": "no image today" } }]
        });
        let (images, content, usage) = parse_response(&body).unwrap();
        assert!(images.is_empty());
        assert_eq!(content, "no image today");
        assert_eq!(usage, TokenUsage::default());
    }
}
