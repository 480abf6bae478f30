use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::security;
use crate::storage::SharedStore;
use super::principal::Principal;
use super::token::TokenSigner;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub name: String,
    pub user_id: Uuid,
}

/// Verifies submitted credentials against the store and issues/validates
/// session tokens. Authentication of a token never touches the store: trust
/// is in the signature alone.
pub struct Authenticator {
    store: SharedStore,
    signer: TokenSigner,
}

impl Authenticator {
    pub fn new(store: SharedStore, signer: TokenSigner) -> Self {
        Self { store, signer }
    }

    /// Look up the user and verify the password. Unknown username and wrong
    /// password collapse into the one `invalid_credentials` value, and the
    /// unknown-username path burns a verification against a dummy hash so the
    /// two cases cost the same.
    pub fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse> {
        // Copy what we need out of the record, then release the lock before
        // the (slow) Argon2 verification.
        let found = {
            let guard = self.store.0.lock();
            guard
                .find_user_by_username(&req.username)
                .map(|u| (u.id, u.name.clone(), u.password_hash.clone()))
        };
        match found {
            Some((user_id, name, hash)) => {
                if !security::verify_password(&hash, &req.password) {
                    return Err(AppError::invalid_credentials());
                }
                let principal = Principal { user_id, username: req.username.clone() };
                let token = self.signer.issue(&principal)?;
                Ok(LoginResponse { token, username: req.username.clone(), name, user_id })
            }
            None => {
                let _ = security::verify_password(security::dummy_phc(), &req.password);
                Err(AppError::invalid_credentials())
            }
        }
    }

    /// Resolve a bearer token into the identity it asserts. Absent, malformed
    /// and unverifiable tokens all map to Unauthorized.
    pub fn authenticate(&self, token: Option<&str>) -> AppResult<Principal> {
        let token = token
            .ok_or_else(|| AppError::unauthorized("missing_token", "authorization token missing"))?;
        self.signer.verify(token)
    }
}
