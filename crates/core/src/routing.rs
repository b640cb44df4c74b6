//! Model-identifier routing: which provider family serves a request.
//!
//! The model id is namespaced with an optional gateway prefix. Exactly one
//! provider kind is selected per request; an unrecognized prefix (or none)
//! falls through to the aggregator with the model string untouched.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Provider kinds
// ---------------------------------------------------------------------------

/// The three upstream families a request can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Vendor API called with the service's own credential.
    Direct,
    /// Same vendor API, billed against the caller's stored credential.
    #[serde(rename = "byo")]
    BringYourOwnKey,
    /// OpenAI-compatible aggregator; the default route.
    Aggregator,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Direct => "direct",
            ProviderKind::BringYourOwnKey => "byo",
            ProviderKind::Aggregator => "aggregator",
        }
    }
}

// ---------------------------------------------------------------------------
// Prefix tables
// ---------------------------------------------------------------------------

/// Prefix routing to the vendor API with the caller's own key.
const BYO_PREFIX: &str = "byo/";

/// Prefixes routing to the vendor API with the service credential.
const DIRECT_PREFIXES: &[&str] = &["direct/", "netlify/", "google/"];

/// Model names that differ between the aggregator and the vendor API. The
/// vendor only serves the preview-suffixed variants of these models.
const DIRECT_MODEL_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("gemini-2.5-flash-image", "gemini-2.5-flash-image-preview"),
    ("gemini-2.0-flash-image", "gemini-2.0-flash-preview-image-generation"),
];

/// Model to use when the client does not name one.
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash-image";

// ---------------------------------------------------------------------------
// GatewaySelection
// ---------------------------------------------------------------------------

/// The routing decision for one request: provider kind plus the model id as
/// the upstream expects it. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySelection {
    pub kind: ProviderKind,
    pub model: String,
}

/// Resolve a namespaced model identifier into a [`GatewaySelection`].
///
/// - `byo/<model>` strips the prefix and routes to [`ProviderKind::BringYourOwnKey`].
/// - `direct/`, `netlify/`, `google/` strip the prefix and route to
///   [`ProviderKind::Direct`].
/// - Anything else routes to [`ProviderKind::Aggregator`] with no suffix
///   stripping.
///
/// Vendor-bound models additionally pass through the substitution table,
/// since the vendor serves some models only under a preview-suffixed name.
pub fn resolve(model: &str) -> GatewaySelection {
    if let Some(suffix) = model.strip_prefix(BYO_PREFIX) {
        return GatewaySelection {
            kind: ProviderKind::BringYourOwnKey,
            model: substitute_vendor_model(suffix),
        };
    }

    for prefix in DIRECT_PREFIXES {
        if let Some(suffix) = model.strip_prefix(prefix) {
            return GatewaySelection {
                kind: ProviderKind::Direct,
                model: substitute_vendor_model(suffix),
            };
        }
    }

    GatewaySelection {
        kind: ProviderKind::Aggregator,
        model: model.to_string(),
    }
}

/// Apply the vendor model-name substitution table.
fn substitute_vendor_model(model: &str) -> String {
    for (from, to) in DIRECT_MODEL_SUBSTITUTIONS {
        if model == *from {
            return (*to).to_string();
        }
    }
    model.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
