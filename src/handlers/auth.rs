/// Handlers de autenticação por cookie de sessão
///
/// O cookie `crm_session` é HttpOnly; o frontend nunca vê o token, só o
/// navegador reenvia. Logout limpa a sessão no banco e zera o cookie.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::Json,
    Extension,
};
use serde_json::{json, Value};
use std::sync::Arc;

use evolution_crm_backend::middleware::{extract_session_token, SESSION_COOKIE};
use evolution_crm_backend::models::{LoginRequest, PublicUser};
use evolution_crm_backend::utils::logging::*;
use evolution_crm_backend::utils::{AppError, AppResult};
use evolution_crm_backend::AppState;

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> AppResult<(HeaderMap, Json<Value>)> {
    log_request_received("/api/auth/login", "POST");

    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::ValidationError(
            "email e password são obrigatórios".to_string(),
        ));
    }

    let (session, user) = state.sessions.login(&body.email, &body.password).await?;

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        session.token,
        state.sessions.session_ttl_seconds()
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        cookie
            .parse()
            .map_err(|_| AppError::InternalError("Failed to build session cookie".to_string()))?,
    );

    Ok((
        headers,
        Json(json!({
            "user": user.to_public(),
            "expires_at": session.expires_at.to_rfc3339()
        })),
    ))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<(HeaderMap, Json<Value>)> {
    log_request_received("/api/auth/logout", "POST");

    if let Some(token) = extract_session_token(&headers) {
        state.sessions.logout(&token).await?;
    }

    // Zera o cookie no navegador
    let cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        SET_COOKIE,
        cookie
            .parse()
            .map_err(|_| AppError::InternalError("Failed to build session cookie".to_string()))?,
    );

    Ok((response_headers, Json(json!({"message": "Logged out"}))))
}

/// GET /api/auth/me
///
/// O usuário vem das extensions, populadas pelo middleware de sessão.
pub async fn me(Extension(user): Extension<PublicUser>) -> Json<Value> {
    Json(json!({"user": user}))
}
