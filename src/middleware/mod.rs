/// Middleware layer para o Axum router
///
/// Este módulo contém middleware customizados para:
/// - Autenticação por cookie de sessão nas rotas /api/*

pub mod session_auth;

pub use session_auth::{extract_session_token, require_session, SESSION_COOKIE};
