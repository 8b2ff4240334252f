use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::extract::{CurrentUser, ValidatedJson, TOKEN_COOKIE};
use super::AppState;
use crate::domain::aggregates::User;
use crate::Result;

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

fn session_cookie(token: &str, max_age: i64) -> String {
    format!("{TOKEN_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age}")
}

pub async fn register(
    State(s): State<AppState>,
    ValidatedJson(r): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let (user, token) = s.services.auth.register(&r.name, &r.email, &r.password).await?;
    let cookie = session_cookie(&token, s.services.auth.tokens().ttl_seconds());
    Ok((StatusCode::CREATED, [(SET_COOKIE, cookie)], Json(AuthResponse { user, token })))
}

pub async fn login(
    State(s): State<AppState>,
    ValidatedJson(r): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse> {
    let (user, token) = s.services.auth.login(&r.email, &r.password).await?;
    let cookie = session_cookie(&token, s.services.auth.tokens().ttl_seconds());
    Ok(([(SET_COOKIE, cookie)], Json(AuthResponse { user, token })))
}

pub async fn logout() -> impl IntoResponse {
    ([(SET_COOKIE, session_cookie("", 0))], StatusCode::NO_CONTENT)
}

pub async fn me(State(s): State<AppState>, CurrentUser(claims): CurrentUser) -> Result<Json<User>> {
    Ok(Json(s.services.auth.current_user(&claims).await?))
}
