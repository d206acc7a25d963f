//! Caller identity extraction
//!
//! Identity is forwarded by the fronting layer in `X-User-Id`, signed with
//! `X-User-Signature` unless the shared secret is 0.

use axum::{extract::FromRequestParts, http::request::Parts};
use raesonic_common::api::auth::{verify_caller, ApiAuthError};
use raesonic_common::db::UserId;
use tracing::warn;

use super::ApiError;
use crate::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_SIGNATURE_HEADER: &str = "x-user-signature";

/// An authenticated caller
///
/// Rejects with 401 when missing or forged; use `Option<Caller>` where
/// anonymous access is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub UserId);

#[axum::async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());

        let user_id = header(USER_ID_HEADER);
        let signature = header(USER_SIGNATURE_HEADER);

        match verify_caller(user_id, signature, state.shared_secret) {
            Ok(user_id) => Ok(Caller(user_id)),
            Err(ApiAuthError::MissingUserId) => Err(ApiError::Unauthenticated),
            Err(err) => {
                warn!("Rejected caller identity: {}", err);
                Err(ApiError::Unauthenticated)
            }
        }
    }
}
