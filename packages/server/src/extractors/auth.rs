use axum::{extract::FromRequestParts, http::request::Parts};
use common::Role;

use crate::error::AppError;
use crate::policy;
use crate::state::AppState;
use crate::utils::jwt;

/// Caller context extracted from the `Authorization: Bearer <token>` header.
///
/// Tokens are issued by the account service; this service only verifies them
/// and trusts the embedded role. Capability checks happen via `require()` in
/// the handler body.
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    /// Returns `Ok(())` if the caller's role grants the capability,
    /// `Err(Forbidden)` otherwise.
    pub fn require(&self, capability: &str) -> Result<(), AppError> {
        policy::require(self.role, capability)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(token, state.config.auth.jwt_secret.as_bytes())
            .map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: claims.uid,
            username: claims.sub,
            role: claims.role,
        })
    }
}
