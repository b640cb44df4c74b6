//! The canonical generation result.

use glaze_core::routing::ProviderKind;
use glaze_core::usage::TokenUsage;

/// Provider-agnostic outcome of one successful upstream call.
///
/// Produced once per 2xx response and never mutated afterwards. `images`
/// may legitimately be empty (the warning outcome); `content` accumulates
/// whatever text the provider returned alongside.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Generated images: data URIs (vendor family) or URLs (aggregator).
    pub images: Vec<String>,
    /// Accumulated text content.
    pub content: String,
    /// Normalized token counts from whichever usage field the family exposes.
    pub usage: TokenUsage,
    /// Wall-clock duration of the upstream call in milliseconds.
    pub elapsed_ms: u64,
    /// Which provider family served the call.
    pub kind: ProviderKind,
    /// The model id as the upstream resolved it.
    pub model: String,
}
