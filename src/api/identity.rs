use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::error::ApiError;

pub const USER_HEADER: &str = "x-user-id";

/// Caller identity, taken from the `x-user-id` header. Authentication happens
/// upstream; a missing or blank header is rejected with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .map(|user| CurrentUser(user.to_string()))
            .ok_or(ApiError::Unauthorized)
    }
}
