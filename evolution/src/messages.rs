// ============================================================================
// Message Manager - Envio de mensagens via Evolution API
// ============================================================================
//
// Encapsula o envio de mensagens de texto por uma instância conectada.
// O número de destino deve conter apenas dígitos (código do país incluso),
// a normalização é responsabilidade do chamador.

use crate::client::EvolutionClient;
use crate::error::{EvolutionError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Gerenciador de envio de mensagens
#[derive(Clone)]
pub struct MessageManager {
    client: EvolutionClient,
}

/// Resposta do envio de texto
///
/// O gateway devolve a chave da mensagem e o status de fila.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendTextResponse {
    #[serde(default)]
    pub key: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "messageTimestamp")]
    pub message_timestamp: Option<Value>,
}

impl MessageManager {
    /// Cria uma nova instância do MessageManager
    pub fn new(client: EvolutionClient) -> Self {
        Self { client }
    }

    /// Envia uma mensagem de texto por uma instância
    ///
    /// `POST /message/sendText/{instance}`
    ///
    /// # Argumentos
    ///
    /// * `instance_name` - Instância conectada que fará o envio
    /// * `number` - Número destino, apenas dígitos (ex: `5511999998888`)
    /// * `text` - Corpo da mensagem
    pub async fn send_text(
        &self,
        instance_name: &str,
        number: &str,
        text: &str,
    ) -> Result<SendTextResponse> {
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(EvolutionError::ValidationError(format!(
                "Número inválido para envio: '{}'",
                number
            )));
        }
        if text.trim().is_empty() {
            return Err(EvolutionError::ValidationError(
                "Mensagem vazia não pode ser enviada".to_string(),
            ));
        }

        let endpoint = format!("/message/sendText/{}", urlencoding::encode(instance_name));
        let body = json!({
            "number": number,
            "text": text,
        });

        let response: SendTextResponse = self.client.post_json(&endpoint, &body).await?;

        tracing::info!(
            "📤 Mensagem enviada via instância '{}' para {}",
            instance_name,
            number
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn manager(server: &MockServer) -> MessageManager {
        MessageManager::new(EvolutionClient::new(server.base_url(), "test-key").unwrap())
    }

    #[tokio::test]
    async fn test_send_text() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/message/sendText/vendas")
                .header("apikey", "test-key")
                .json_body(serde_json::json!({
                    "number": "5511999998888",
                    "text": "Olá!"
                }));
            then.status(201).json_body(serde_json::json!({
                "key": {"id": "ABC123"},
                "status": "PENDING"
            }));
        });

        let response = manager(&server)
            .send_text("vendas", "5511999998888", "Olá!")
            .await
            .unwrap();

        mock.assert();
        assert_eq!(response.status.as_deref(), Some("PENDING"));
    }

    #[tokio::test]
    async fn test_send_text_rejects_non_digit_number() {
        let server = MockServer::start();
        let err = manager(&server)
            .send_text("vendas", "+55 11 99999-8888", "Olá!")
            .await
            .unwrap_err();
        assert!(matches!(err, EvolutionError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_send_text_rejects_empty_message() {
        let server = MockServer::start();
        let err = manager(&server)
            .send_text("vendas", "5511999998888", "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, EvolutionError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_send_text_gateway_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/message/sendText/desconectada");
            then.status(400).json_body(serde_json::json!({
                "message": "Connection Closed"
            }));
        });

        let err = manager(&server)
            .send_text("desconectada", "5511999998888", "Olá!")
            .await
            .unwrap_err();
        assert!(matches!(err, EvolutionError::ApiError { status: 400, .. }));
    }
}
