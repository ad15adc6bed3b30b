use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity, injected by the authenticating gateway in front of
/// this service. Token verification happens upstream; by the time a
/// request reaches us the header either carries a member id or the
/// caller is anonymous.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|id| !id.is_empty())
            .map(|id| AuthUser(id.to_string()))
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}
