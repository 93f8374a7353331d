/// Conexão com o Postgres e aplicação do schema
///
/// O schema é embutido no binário e aplicado na subida (idempotente, tudo
/// é CREATE ... IF NOT EXISTS), então o deploy não depende de um passo de
/// migração separado.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::settings::DatabaseSettings;
use crate::utils::logging::*;
use crate::utils::{AppError, AppResult};

const SCHEMA_SQL: &str = include_str!("../migrations/001_schema.sql");

/// Abre o pool de conexões
pub async fn connect(settings: &DatabaseSettings) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&settings.url)
        .await
        .map_err(|e| AppError::ConfigError(format!("Failed to connect to database: {}", e)))?;

    log_info("✅ Conexão com o banco estabelecida");

    Ok(pool)
}

/// Aplica o schema na subida
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    let statements = split_sql_statements(SCHEMA_SQL);
    let total = statements.len();

    for (idx, statement) in statements.iter().enumerate() {
        sqlx::query(statement).execute(pool).await.map_err(|e| {
            AppError::ConfigError(format!(
                "Migration statement {}/{} failed: {}",
                idx + 1,
                total,
                e
            ))
        })?;
    }

    log_info(&format!("✅ Schema aplicado ({} statements)", total));

    Ok(())
}

/// Divide o SQL em statements
///
/// O schema não usa funções PL/pgSQL (sem dollar-quoting), então basta
/// quebrar em `;` ignorando comentários e linhas vazias.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }

        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            statements.push(current.trim().to_string());
            current.clear();
        }
    }

    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ignores_comments_and_blank_lines() {
        let sql = "-- comentário\n\nCREATE TABLE a (id INT);\n\nCREATE TABLE b (\n  id INT\n);\n";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE a"));
        assert!(statements[1].contains("CREATE TABLE b"));
    }

    #[test]
    fn test_schema_splits_into_statements() {
        let statements = split_sql_statements(SCHEMA_SQL);
        // Extensão + 8 tabelas + índices
        assert!(statements.len() >= 9);
        assert!(statements.iter().all(|s| s.ends_with(';')));
    }
}
