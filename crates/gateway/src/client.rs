//! The upstream HTTP client and dispatch entry point.
//!
//! [`GatewayClient`] issues exactly one upstream call per request and
//! classifies the outcome. It performs no billing and no logging of job
//! events; it is a protocol translator plus classifier, and the API layer
//! owns everything that follows.

use std::time::Instant;

use serde_json::Value;

use glaze_core::request::GenerationRequest;
use glaze_core::routing::{GatewaySelection, ProviderKind};

use crate::error::{classify_status, GatewayError};
use crate::result::GenerationResult;
use crate::{aggregator, direct};

/// Base URLs for the two upstream APIs.
#[derive(Debug, Clone)]
pub struct GatewayEndpoints {
    /// Vendor API base, e.g. `https://generativelanguage.googleapis.com`.
    pub direct_base_url: String,
    /// Aggregator base, e.g. `https://openrouter.ai/api/v1`.
    pub aggregator_base_url: String,
}

/// HTTP client for upstream provider calls.
pub struct GatewayClient {
    http: reqwest::Client,
    endpoints: GatewayEndpoints,
}

impl GatewayClient {
    /// Build the client.
    ///
    /// Deliberately no request timeout: image generation can outlive any
    /// reasonable client-side ceiling, and the host environment's own limit
    /// is the only bound.
    pub fn new(endpoints: GatewayEndpoints) -> Self {
        let http = reqwest::Client::builder()
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { http, endpoints }
    }

    /// Issue the single upstream call for a routed request.
    ///
    /// `credential` is the service key for the direct/aggregator routes or
    /// the caller's stored key for the BYO route; resolving which one to
    /// use is the caller's job.
    pub async fn dispatch(
        &self,
        selection: &GatewaySelection,
        request: &GenerationRequest,
        credential: &str,
    ) -> Result<GenerationResult, GatewayError> {
        let started = Instant::now();

        let response = match selection.kind {
            ProviderKind::Direct | ProviderKind::BringYourOwnKey => {
                let body = direct::build_request(request)?;
                let url = format!(
                    "{}/v1beta/models/{}:generateContent",
                    self.endpoints.direct_base_url, selection.model
                );
                self.http
                    .post(&url)
                    .header("x-goog-api-key", credential)
                    .json(&body)
                    .send()
                    .await?
            }
            ProviderKind::Aggregator => {
                let body = aggregator::build_request(request, &selection.model);
                let url = format!("{}/chat/completions", self.endpoints.aggregator_base_url);
                self.http
                    .post(&url)
                    .bearer_auth(credential)
                    .json(&body)
                    .send()
                    .await?
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_status(status.as_u16(), &body);
            tracing::warn!(
                gateway = selection.kind.as_str(),
                model = %selection.model,
                status = status.as_u16(),
                error = %err,
                "Upstream call failed"
            );
            return Err(err);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(format!("reading upstream body: {e}")))?;

        let (images, content, usage) = match selection.kind {
            ProviderKind::Direct | ProviderKind::BringYourOwnKey => direct::parse_response(&body)?,
            ProviderKind::Aggregator => aggregator::parse_response(&body)?,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            gateway = selection.kind.as_str(),
            model = %selection.model,
            image_count = images.len(),
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            elapsed_ms,
            "Upstream call completed"
        );

        Ok(GenerationResult {
            images,
            content,
            usage,
            elapsed_ms,
            kind: selection.kind,
            model: selection.model.clone(),
        })
    }
}
