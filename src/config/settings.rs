use serde::{Deserialize, Serialize};
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub evolution: EvolutionSettings,
    pub auth: AuthSettings,
    pub scheduler: SchedulerSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EvolutionSettings {
    /// URL do gateway Evolution API (ex: http://localhost:8080)
    pub base_url: String,
    /// apikey global do gateway (AUTHENTICATION_API_KEY)
    pub api_key: String,
    /// Instância padrão para lembretes quando o agendamento não indica uma
    pub default_instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthSettings {
    /// Tempo de vida da sessão em horas
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    /// Admin inicial criado na primeira subida (se a tabela users estiver vazia)
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerSettings {
    /// Loop interno de verificação de lembretes (o cron externo pode chamar
    /// /api/recurrence/check em vez disso)
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// Quantos lembretes processar por passada
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    /// Tentativas de envio antes de marcar como failed
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
}

fn default_max_connections() -> u32 {
    5
}

fn default_session_ttl_hours() -> i64 {
    24 * 7
}

fn default_interval_seconds() -> u64 {
    60
}

fn default_batch_size() -> i64 {
    50
}

fn default_max_attempts() -> i32 {
    3
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        // Variáveis de ambiente mais usadas em deploy
        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }
        if let Ok(base_url) = std::env::var("EVOLUTION_API_URL") {
            builder = builder.set_override("evolution.base_url", base_url)?;
        }
        if let Ok(api_key) = std::env::var("EVOLUTION_API_KEY") {
            builder = builder.set_override("evolution.api_key", api_key)?;
        }
        if let Ok(email) = std::env::var("ADMIN_EMAIL") {
            builder = builder.set_override("auth.admin_email", email)?;
        }
        if let Ok(password) = std::env::var("ADMIN_PASSWORD") {
            builder = builder.set_override("auth.admin_password", password)?;
        }

        // Overrides com prefixo (ex: CRM__SCHEDULER__ENABLED=true)
        builder = builder.add_source(Environment::with_prefix("CRM").separator("__"));

        let s = builder.build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_deserialization() {
        let settings: Settings = serde_json::from_value(serde_json::json!({
            "server": {"host": "0.0.0.0", "port": 3000},
            "database": {"url": "postgres://localhost/crm"},
            "evolution": {"base_url": "http://localhost:8080", "api_key": "k", "default_instance": null},
            "auth": {},
            "scheduler": {}
        }))
        .unwrap();

        assert_eq!(settings.database.max_connections, 5);
        assert_eq!(settings.auth.session_ttl_hours, 168);
        assert!(!settings.scheduler.enabled);
        assert_eq!(settings.scheduler.interval_seconds, 60);
        assert_eq!(settings.scheduler.batch_size, 50);
        assert_eq!(settings.scheduler.max_attempts, 3);
    }
}
