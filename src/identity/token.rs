use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use super::principal::Principal;

/// Claims carried by a session token. `sub` is the user id, `iat` is always
/// present; `exp` only when the signer was configured with a lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Issues and verifies HS256-signed session tokens. Verification is a pure
/// signature (+ optional expiry) check; no server-side session state exists,
/// so a token stays valid until the secret rotates or its `exp` passes.
pub struct TokenSigner {
    enc: EncodingKey,
    dec: DecodingKey,
    ttl: Option<Duration>,
    validation: Validation,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl: Option<Duration>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Tokens issued without a configured lifetime carry no exp claim and
        // must still verify; expiry is enforced only when the claim is present.
        validation.required_spec_claims.clear();
        validation.leeway = 0;
        Self {
            enc: EncodingKey::from_secret(secret.as_bytes()),
            dec: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            validation,
        }
    }

    pub fn issue(&self, principal: &Principal) -> AppResult<String> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: principal.user_id.to_string(),
            username: principal.username.clone(),
            iat,
            exp: self.ttl.map(|t| iat + t.as_secs() as i64),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.enc).map_err(|e| {
            error!("token encode failed: {e}");
            AppError::internal("token_encode", "failed to issue session token")
        })
    }

    /// Decode and verify a token, returning the embedded identity. Every
    /// failure cause (malformed, bad signature, expired) maps to the same
    /// Unauthorized value.
    pub fn verify(&self, token: &str) -> AppResult<Principal> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.dec, &self.validation)
            .map_err(|_| Self::rejection())?;
        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| Self::rejection())?;
        Ok(Principal { user_id, username: data.claims.username })
    }

    fn rejection() -> AppError {
        AppError::unauthorized("invalid_token", "session token missing or invalid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("unit-test-secret", None)
    }

    fn principal() -> Principal {
        Principal { user_id: Uuid::new_v4(), username: "alice".to_string() }
    }

    #[test]
    fn issue_then_verify_round_trip() {
        let s = signer();
        let p = principal();
        let token = s.issue(&p).unwrap();
        let got = s.verify(&token).unwrap();
        assert_eq!(got, p);
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = signer().issue(&principal()).unwrap();
        let other = TokenSigner::new("a-different-secret", None);
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn garbage_token_rejected() {
        let s = signer();
        assert!(s.verify("").is_err());
        assert!(s.verify("not.a.token").is_err());
    }

    #[test]
    fn tampered_payload_rejected() {
        let s = signer();
        let token = s.issue(&principal()).unwrap();
        // Flip a character inside the payload segment
        let mut parts: Vec<String> = token.split('.').map(|s| s.to_string()).collect();
        let mid = parts[1].clone();
        let flipped = if mid.starts_with('A') { "B" } else { "A" };
        parts[1] = format!("{}{}", flipped, &mid[1..]);
        assert!(s.verify(&parts.join(".")).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        // Encode claims with an exp in the past using the same secret; the
        // verifier must refuse them.
        let s = signer();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            username: "alice".to_string(),
            iat: now - 7200,
            exp: Some(now - 3600),
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("unit-test-secret".as_bytes()),
        )
        .unwrap();
        assert!(s.verify(&token).is_err());
    }

    #[test]
    fn ttl_configured_signer_embeds_exp() {
        let s = TokenSigner::new("unit-test-secret", Some(Duration::from_secs(3600)));
        let token = s.issue(&principal()).unwrap();
        // Still verifies now, and carries an exp claim roughly one hour out
        let ok = s.verify(&token);
        assert!(ok.is_ok());
        let data = jsonwebtoken::decode::<Claims>(
            &token,
            &DecodingKey::from_secret("unit-test-secret".as_bytes()),
            &{
                let mut v = Validation::new(Algorithm::HS256);
                v.required_spec_claims.clear();
                v
            },
        )
        .unwrap();
        let exp = data.claims.exp.expect("exp claim present");
        assert!(exp > data.claims.iat);
    }
}
