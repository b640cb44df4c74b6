//! Server configuration, loaded once at startup and passed by reference.
//!
//! No component reads the environment after boot; everything flows through
//! this struct so tests can inject fakes.

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// Identity-verifier settings (external provider's signing secret).
    pub identity: IdentityConfig,
    /// Upstream gateway credentials and endpoints.
    pub gateway: GatewayConfig,
    /// Request limits and billing knobs.
    pub limits: LimitsConfig,
    /// Shared secret for payment-webhook signature verification.
    pub webhook_secret: String,
}

/// Settings for verifying externally issued bearer tokens.
///
/// This service never issues tokens; it only validates HS256 JWTs signed by
/// the identity provider.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub jwt_secret: String,
}

/// Upstream provider credentials and base URLs.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Service-wide vendor API key. Absence fails direct-route requests
    /// with a configuration error, not a validation error.
    pub direct_api_key: Option<String>,
    /// Service-wide aggregator API key.
    pub aggregator_api_key: Option<String>,
    pub direct_base_url: String,
    pub aggregator_base_url: String,
}

/// Limits and billing constants, all overridable per deployment.
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Maximum instruction length in characters.
    pub max_instruction_chars: usize,
    /// Maximum decoded size of a single submitted image, in bytes.
    pub max_image_bytes: u64,
    /// Minimum balance required before dispatch (coarse admission control;
    /// the true cost is only known after completion).
    pub min_balance_tokens: i64,
    /// Minimum tokens charged per non-BYO generation. Reported usage below
    /// this (including zero from an incomplete provider response) is floored
    /// here so the service never does unmetered work.
    pub fallback_token_cost: i64,
}

/// Default vendor API base URL.
const DEFAULT_DIRECT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// Default aggregator base URL.
const DEFAULT_AGGREGATOR_BASE_URL: &str = "https://openrouter.ai/api/v1";

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Required | Default                   |
    /// |-----------------------------|----------|---------------------------|
    /// | `HOST`                      | no       | `0.0.0.0`                 |
    /// | `PORT`                      | no       | `3000`                    |
    /// | `CORS_ORIGINS`              | no       | `http://localhost:5173`   |
    /// | `AUTH_JWT_SECRET`           | **yes**  | --                        |
    /// | `PAYMENT_WEBHOOK_SECRET`    | **yes**  | --                        |
    /// | `GATEWAY_DIRECT_API_KEY`    | no       | unset                     |
    /// | `GATEWAY_AGGREGATOR_API_KEY`| no       | unset                     |
    /// | `GATEWAY_DIRECT_BASE_URL`   | no       | Google AI endpoint        |
    /// | `GATEWAY_AGGREGATOR_BASE_URL`| no      | OpenRouter endpoint       |
    /// | `MAX_INSTRUCTION_CHARS`     | no       | `10000`                   |
    /// | `MAX_IMAGE_BYTES`           | no       | `26214400` (25 MiB)       |
    /// | `MIN_BALANCE_TOKENS`        | no       | `500`                     |
    /// | `FALLBACK_TOKEN_COST`       | no       | `1290`                    |
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing or a numeric one fails to
    /// parse; misconfiguration should fail fast at boot.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let jwt_secret = std::env::var("AUTH_JWT_SECRET")
            .expect("AUTH_JWT_SECRET must be set in the environment");
        assert!(!jwt_secret.is_empty(), "AUTH_JWT_SECRET must not be empty");

        let webhook_secret = std::env::var("PAYMENT_WEBHOOK_SECRET")
            .expect("PAYMENT_WEBHOOK_SECRET must be set in the environment");
        assert!(
            !webhook_secret.is_empty(),
            "PAYMENT_WEBHOOK_SECRET must not be empty"
        );

        let gateway = GatewayConfig {
            direct_api_key: non_empty_var("GATEWAY_DIRECT_API_KEY"),
            aggregator_api_key: non_empty_var("GATEWAY_AGGREGATOR_API_KEY"),
            direct_base_url: std::env::var("GATEWAY_DIRECT_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_DIRECT_BASE_URL.into()),
            aggregator_base_url: std::env::var("GATEWAY_AGGREGATOR_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_AGGREGATOR_BASE_URL.into()),
        };

        let limits = LimitsConfig {
            max_instruction_chars: parsed_var("MAX_INSTRUCTION_CHARS", 10_000),
            max_image_bytes: parsed_var("MAX_IMAGE_BYTES", 25 * 1024 * 1024),
            min_balance_tokens: parsed_var("MIN_BALANCE_TOKENS", 500),
            fallback_token_cost: parsed_var("FALLBACK_TOKEN_COST", 1290),
        };

        Self {
            host,
            port,
            cors_origins,
            identity: IdentityConfig { jwt_secret },
            gateway,
            limits,
            webhook_secret,
        }
    }
}

/// Read an optional env var, treating empty strings as unset.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read a numeric env var with a default.
fn parsed_var<T: std::str::FromStr>(name: &str, default: T) -> T
where
    T::Err: std::fmt::Debug,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be a valid number: {e:?}")),
        Err(_) => default,
    }
}
