use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use seolink_core::{OwnerId, Scope};

use crate::error::AppError;
use crate::state::{AppState, Tenancy};

pub const OWNER_HEADER: &str = "x-owner-id";

/// The visibility scope of the caller.
///
/// Single-tenant deployments always get [`Scope::All`]. Multi-tenant ones
/// take the owner from the `x-owner-id` header set by the upstream auth
/// layer and reject requests without it.
#[derive(Debug, Clone)]
pub struct Caller(pub Scope);

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if state.tenancy() == Tenancy::Single {
            return Ok(Caller(Scope::All));
        }

        let owner = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| OwnerId::new(value.trim()).ok())
            .ok_or(AppError::MissingOwner)?;
        Ok(Caller(Scope::Owner(owner)))
    }
}
