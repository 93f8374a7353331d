/// Serviço de autenticação por cookie de sessão
///
/// Fluxo:
/// 1. Login valida email + senha (SHA-256 com salt por usuário)
/// 2. Cria uma linha em `sessions` com token aleatório e TTL configurável
/// 3. O middleware valida o token do cookie a cada requisição
///
/// Sessões expiradas são removidas na própria validação, então não há
/// job de limpeza separado.

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::settings::AuthSettings;
use crate::models::{Session, User};
use crate::utils::logging::*;
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct SessionService {
    db: PgPool,
    settings: AuthSettings,
}

impl SessionService {
    pub fn new(db: PgPool, settings: AuthSettings) -> Self {
        Self { db, settings }
    }

    /// Hash de senha: SHA-256(salt || senha), codificado em hex
    pub fn hash_password(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn verify_password(user: &User, password: &str) -> bool {
        let computed = Self::hash_password(&user.password_salt, password);
        constant_time_eq(computed.as_bytes(), user.password_hash.as_bytes())
    }

    /// Autentica e abre uma sessão nova
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(Session, User)> {
        let email = email.trim().to_lowercase();

        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, password_hash, password_salt, created_at
             FROM users WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Credenciais inválidas".to_string()))?;

        if !Self::verify_password(&user, password) {
            log_warning(&format!("❌ Login recusado para {}", email));
            return Err(AppError::Unauthorized("Credenciais inválidas".to_string()));
        }

        let token = format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        );
        let expires_at = Utc::now() + Duration::hours(self.settings.session_ttl_hours);

        let session = sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (token, user_id, expires_at)
             VALUES ($1, $2, $3)
             RETURNING token, user_id, expires_at, created_at",
        )
        .bind(&token)
        .bind(user.id)
        .bind(expires_at)
        .fetch_one(&self.db)
        .await?;

        log_info(&format!("✅ Sessão aberta para {}", email));

        Ok((session, user))
    }

    /// Encerra a sessão do token (idempotente)
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Valida o token do cookie e devolve o usuário dono da sessão
    ///
    /// Sessões vencidas são apagadas na hora e tratadas como inválidas.
    pub async fn validate(&self, token: &str) -> AppResult<User> {
        let row = sqlx::query_as::<_, Session>(
            "SELECT token, user_id, expires_at, created_at FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Sessão inválida".to_string()))?;

        if row.is_expired(Utc::now()) {
            sqlx::query("DELETE FROM sessions WHERE token = $1")
                .bind(token)
                .execute(&self.db)
                .await?;
            return Err(AppError::Unauthorized("Sessão expirada".to_string()));
        }

        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, password_hash, password_salt, created_at
             FROM users WHERE id = $1",
        )
        .bind(row.user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Sessão inválida".to_string()))?;

        Ok(user)
    }

    /// Cria o admin inicial na primeira subida, se configurado
    pub async fn ensure_admin(&self) -> AppResult<()> {
        let (email, password) = match (
            self.settings.admin_email.as_ref(),
            self.settings.admin_password.as_ref(),
        ) {
            (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
            _ => {
                log_warning("⚠️ ADMIN_EMAIL/ADMIN_PASSWORD não configurados - nenhum admin inicial criado");
                return Ok(());
            }
        };

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;

        if count > 0 {
            return Ok(());
        }

        let salt = Uuid::new_v4().simple().to_string();
        let hash = Self::hash_password(&salt, password);

        sqlx::query(
            "INSERT INTO users (email, name, password_hash, password_salt)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(email.trim().to_lowercase())
        .bind("Administrador")
        .bind(hash)
        .bind(salt)
        .execute(&self.db)
        .await?;

        log_info(&format!("✅ Admin inicial criado: {}", email));

        Ok(())
    }

    /// TTL configurado, em segundos (para o Max-Age do cookie)
    pub fn session_ttl_seconds(&self) -> i64 {
        self.settings.session_ttl_hours * 3600
    }
}

// Comparação de tempo constante para evitar timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic_and_salted() {
        let h1 = SessionService::hash_password("salt-a", "senha123");
        let h2 = SessionService::hash_password("salt-a", "senha123");
        let h3 = SessionService::hash_password("salt-b", "senha123");

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(h1.len(), 64); // SHA-256 em hex
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
