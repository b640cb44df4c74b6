//! Verification of externally issued access tokens.
//!
//! Token *issuance* belongs to the external identity provider; this module
//! only validates HS256-signed JWTs against the shared secret and extracts
//! the subject. The subject is treated as an opaque user identifier.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::IdentityConfig;

/// The claims this service reads from an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the identity provider's opaque user id.
    pub sub: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Validates the signature and expiration automatically.
pub fn validate_token(
    token: &str,
    config: &IdentityConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(), // HS256
    )?;
    Ok(data.claims)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn config() -> IdentityConfig {
        IdentityConfig {
            jwt_secret: "test-secret".to_string(),
        }
    }

    fn mint(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_round_trips_subject() {
        let now = chrono::Utc::now().timestamp();
        let token = mint(
            &Claims {
                sub: "user_abc".to_string(),
                exp: now + 3600,
                iat: now,
            },
            "test-secret",
        );
        let claims = validate_token(&token, &config()).unwrap();
        assert_eq!(claims.sub, "user_abc");
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = chrono::Utc::now().timestamp();
        let token = mint(
            &Claims {
                sub: "user_abc".to_string(),
                exp: now - 3600,
                iat: now - 7200,
            },
            "test-secret",
        );
        assert!(validate_token(&token, &config()).is_err());
    }

    #[test]
    fn token_signed_with_wrong_secret_is_rejected() {
        let now = chrono::Utc::now().timestamp();
        let token = mint(
            &Claims {
                sub: "user_abc".to_string(),
                exp: now + 3600,
                iat: now,
            },
            "other-secret",
        );
        assert!(validate_token(&token, &config()).is_err());
    }
}
