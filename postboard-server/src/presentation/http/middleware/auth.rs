use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::domain::user::Actor;
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppError;

/// Caller resolved by [`jwt_auth_middleware`]; only available on routes
/// behind it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AuthenticatedUser {
    pub(crate) actor: Actor,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}

/// Caller on routes open to guests. No `Authorization` header means a guest;
/// a header that does not verify is still rejected.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MaybeUser(pub(crate) Option<Actor>);

impl MaybeUser {
    pub(crate) fn actor(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers)? {
            Some(token) => Ok(MaybeUser(Some(verify(state, token)?))),
            None => Ok(MaybeUser(None)),
        }
    }
}

pub(crate) async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?.ok_or(AppError::Unauthorized)?;
    let actor = verify(&state, token)?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { actor });

    Ok(next.run(request).await)
}

fn verify(state: &AppState, token: &str) -> Result<Actor, AppError> {
    state
        .jwt
        .verify_token(token)
        .map(|claims| claims.actor())
        .map_err(|_| AppError::Unauthorized)
}

/// `Ok(None)` when the header is absent, an error when it is malformed.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let auth_header = value.to_str().map_err(|_| AppError::Unauthorized)?;

    let mut parts = auth_header.split_whitespace();
    let scheme = parts.next().ok_or(AppError::Unauthorized)?;
    let token = parts.next().ok_or(AppError::Unauthorized)?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::Unauthorized);
    }
    Ok(Some(token))
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, header};

    use super::bearer_token;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn missing_header_is_a_guest() {
        assert!(matches!(bearer_token(&HeaderMap::new()), Ok(None)));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        let headers = headers("bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers).ok().flatten(), Some("abc.def.ghi"));
    }

    #[test]
    fn malformed_headers_are_rejected() {
        for value in ["Basic abc", "Bearer", "Bearer a b", ""] {
            assert!(bearer_token(&headers(value)).is_err(), "{value:?} accepted");
        }
    }
}
