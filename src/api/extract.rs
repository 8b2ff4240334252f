//! Request extractors: validated JSON bodies and the authenticated caller.

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use super::AppState;
use crate::services::Claims;
use crate::EcommerceError;

pub const TOKEN_COOKIE: &str = "token";

/// JSON body that must deserialize and pass its `validator` rules; both failures are a 400.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = EcommerceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| EcommerceError::validation(rejection.body_text()))?;
        value.validate().map_err(|e| EcommerceError::validation(e.to_string()))?;
        Ok(Self(value))
    }
}

/// Query string with the crate's error body on rejection.
pub struct QueryParams<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = EcommerceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| EcommerceError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// `Authorization: Bearer <token>` wins over the `token` cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    bearer.or_else(|| {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == TOKEN_COOKIE && !value.is_empty())
            .map(|(_, value)| value.to_string())
    })
}

pub struct CurrentUser(pub Claims);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = EcommerceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers)
            .ok_or_else(|| EcommerceError::Unauthorized("authentication required".into()))?;
        state.services.auth.authenticate(&token).map(Self)
    }
}

pub struct AdminUser(pub Claims);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = EcommerceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(claims) = CurrentUser::from_request_parts(parts, state).await?;
        if !claims.is_admin() {
            return Err(EcommerceError::Forbidden);
        }
        Ok(Self(claims))
    }
}

/// Anonymous callers are allowed; a present but invalid token is still rejected.
pub struct MaybeUser(pub Option<Claims>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = EcommerceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match session_token(&parts.headers) {
            Some(token) => state.services.auth.authenticate(&token).map(|c| Self(Some(c))),
            None => Ok(Self(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_token_sources() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; token=abc.def"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz.123"));
        assert_eq!(session_token(&headers).as_deref(), Some("xyz.123"));
    }
}
