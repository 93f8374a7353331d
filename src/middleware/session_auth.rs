/// Middleware de autenticação por cookie de sessão
///
/// Valida que a requisição carrega um cookie `crm_session` com token de
/// sessão válido (não expirado). Protege todas as rotas /api/* exceto o
/// login.
///
/// # Uso na requisição
///
/// ```bash
/// curl -b "crm_session=<token>" https://crm.example.com/api/leads
/// ```
///
/// # Respostas
///
/// - **200 OK**: sessão válida, continua para o handler (o usuário fica
///   disponível nas extensions da request)
/// - **401 Unauthorized**: cookie ausente, token inválido ou expirado

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::AppState;

pub const SESSION_COOKIE: &str = "crm_session";

/// Extrai o token de sessão do header Cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;

    cookie_header
        .split(';')
        .map(|part| part.trim())
        .find_map(|part| part.strip_prefix(&format!("{}=", SESSION_COOKIE)))
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
}

/// Middleware que exige sessão válida
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = match extract_session_token(request.headers()) {
        Some(token) => token,
        None => {
            tracing::debug!("❌ Acesso negado - cookie de sessão ausente");
            return Err(unauthorized_response("Missing session cookie"));
        }
    };

    match state.sessions.validate(&token).await {
        Ok(user) => {
            // Handler de /api/auth/me lê o usuário das extensions
            request.extensions_mut().insert(user.to_public());
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::debug!("❌ Acesso negado - {}", e);
            Err(unauthorized_response("Invalid or expired session"))
        }
    }
}

/// Resposta de erro 401 Unauthorized
fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "Unauthorized",
            "message": message,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn test_extract_session_token() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "foo=bar; crm_session=abc123; other=x".parse().unwrap());
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_extract_missing_cookie() {
        let headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "foo=bar".parse().unwrap());
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn test_extract_empty_token_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "crm_session=".parse().unwrap());
        assert_eq!(extract_session_token(&headers), None);
    }
}
