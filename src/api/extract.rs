//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::error::ApiErrorResponse;
use super::handlers::AppState;
use crate::domain::UserId;

/// The user behind the request's bearer token.
///
/// Rejects with 401 when the header is missing, malformed or names an
/// unknown session. Handlers list it first so the check happens before the
/// body is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token);

        token
            .and_then(|token| state.sessions.resolve(token))
            .map(Self)
            .ok_or_else(|| {
                tracing::debug!(path = %parts.uri.path(), "Rejected request without session");
                ApiErrorResponse::unauthorized()
            })
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
