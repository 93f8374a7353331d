//! Cliente HTTP para a Evolution API

use crate::error::{EvolutionError, Result};
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Cliente para interagir com o gateway Evolution API
///
/// Encapsula a URL base do gateway e a apikey global. Todos os endpoints
/// de instância e mensagem são construídos sobre este cliente.
#[derive(Clone)]
pub struct EvolutionClient {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
}

impl EvolutionClient {
    /// Cria um novo cliente Evolution
    ///
    /// # Argumentos
    ///
    /// * `base_url` - URL do gateway (ex: `http://localhost:8080`)
    /// * `api_key` - apikey global do gateway
    ///
    /// # Timeouts
    ///
    /// - Total: 30s
    /// - Connect: 5s
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(base_url, api_key, 30, 5)
    }

    /// Cria um novo cliente com timeouts customizados
    pub fn with_timeouts(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        total_timeout_secs: u64,
        connect_timeout_secs: u64,
    ) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(total_timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()
            .map_err(|e| EvolutionError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into();
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Executa uma requisição GET
    pub(crate) async fn get(&self, endpoint: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Executa uma requisição GET e parseia JSON
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let response = self.get(endpoint).await?;
        let json = response.json().await?;
        Ok(json)
    }

    /// Executa uma requisição POST
    pub(crate) async fn post(&self, endpoint: &str, body: &Value) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("POST {} with body: {}", url, serde_json::to_string(body).unwrap_or_default());

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Executa uma requisição POST e parseia JSON
    pub(crate) async fn post_json<T: DeserializeOwned>(&self, endpoint: &str, body: &Value) -> Result<T> {
        let response = self.post(endpoint, body).await?;
        let json = response.json().await?;
        Ok(json)
    }

    /// Executa uma requisição DELETE
    pub(crate) async fn delete(&self, endpoint: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("DELETE {}", url);

        let response = self
            .http_client
            .delete(&url)
            .header("apikey", &self.api_key)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Processa a resposta HTTP e trata erros
    async fn handle_response(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else {
            let status_code = status.as_u16();
            let error_body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

            tracing::error!("Evolution API error ({}): {}", status_code, error_body);

            // Tentar extrair mensagem de erro do JSON
            // O Evolution API devolve `{"response": {"message": [...]}}` ou `{"message": "..."}`
            let message = if let Ok(json) = serde_json::from_str::<Value>(&error_body) {
                json.pointer("/response/message")
                    .or_else(|| json.get("message"))
                    .or_else(|| json.get("error"))
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or(error_body)
            } else {
                error_body
            };

            Err(EvolutionError::ApiError {
                status: status_code,
                message,
            })
        }
    }

    /// Obtém a apikey configurada
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Obtém a URL base do gateway
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = EvolutionClient::new("http://localhost:8080", "test-key").unwrap();
        assert_eq!(client.api_key(), "test-key");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_strips_trailing_slash() {
        let client = EvolutionClient::new("http://localhost:8080/", "test-key").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_with_custom_timeouts() {
        let client = EvolutionClient::with_timeouts("http://gw", "k", 60, 10).unwrap();
        assert_eq!(client.base_url(), "http://gw");
    }
}
