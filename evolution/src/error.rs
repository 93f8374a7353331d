//! Tipos de erro para o crate evolution

use thiserror::Error;

/// Erros do cliente Evolution API
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// Erro de requisição HTTP
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Erro da API Evolution (status code não-2xx)
    #[error("Evolution API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Instância não encontrada no gateway
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    /// Erro de configuração
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Erro de validação
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, EvolutionError>;
