use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the authenticated user's id, set by the upstream auth layer
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing user id".to_string()))?;

        header
            .to_str()
            .ok()
            .and_then(|value| Uuid::parse_str(value).ok())
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Invalid user id".to_string()))
    }
}
