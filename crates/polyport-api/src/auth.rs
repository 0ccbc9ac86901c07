//! Request authentication
//!
//! The host judge terminates sessions; requests reaching this router carry
//! the authenticated profile id in `X-Profile-Id`. Capability checks go
//! through the judge client.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use polyport_judge::ProfileId;

use crate::error::ApiError;

/// The authenticated judge profile making the request
#[derive(Debug, Clone, Copy)]
pub struct Requester(pub ProfileId);

impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-profile-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<i64>().ok())
            .map(|id| Self(ProfileId(id)))
            .ok_or(ApiError::Unauthorized)
    }
}
