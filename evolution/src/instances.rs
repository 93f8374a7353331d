// ============================================================================
// Instance Manager - Ciclo de vida de instâncias WhatsApp no Evolution API
// ============================================================================
//
// Este módulo encapsula as operações de instância do gateway:
//
// 1. **Ciclo de vida:**
//    - Criação de instância (create_instance)
//    - Listagem de instâncias (fetch_instances)
//    - Remoção de instância (delete_instance)
//
// 2. **Conexão:**
//    - QR code / pairing code (connect)
//    - Estado da conexão (connection_state)
//    - Logout da sessão WhatsApp (logout)
//
// Uma "instância" é uma sessão WhatsApp gerenciada inteiramente pelo
// gateway. O CRM não guarda estado de conexão localmente.

use crate::client::EvolutionClient;
use crate::error::{EvolutionError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Gerenciador de instâncias do Evolution API
///
/// Implementa `Clone` e pode ser compartilhado entre threads via `Arc<>`.
#[derive(Clone)]
pub struct InstanceManager {
    client: EvolutionClient,
}

/// Requisição de criação de instância
#[derive(Debug, Clone, Serialize)]
pub struct CreateInstanceRequest {
    pub instance_name: String,
    /// Gerar QR code imediatamente após a criação
    pub qrcode: bool,
    /// Motor de integração (o gateway aceita "WHATSAPP-BAILEYS")
    pub integration: Option<String>,
}

impl CreateInstanceRequest {
    pub fn new(instance_name: impl Into<String>) -> Self {
        Self {
            instance_name: instance_name.into(),
            qrcode: true,
            integration: Some("WHATSAPP-BAILEYS".to_string()),
        }
    }
}

/// Informações de uma instância retornadas pelo gateway
///
/// O formato varia entre versões do Evolution API, então os campos são
/// opcionais e o restante fica em `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceInfo {
    #[serde(default, alias = "instanceName", alias = "name")]
    pub instance_name: Option<String>,
    #[serde(default, alias = "connectionStatus", alias = "status")]
    pub connection_status: Option<String>,
    #[serde(default, alias = "ownerJid")]
    pub owner_jid: Option<String>,
    #[serde(default, alias = "profileName")]
    pub profile_name: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// QR code / pairing code devolvido por `GET /instance/connect/{name}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrCode {
    #[serde(default, alias = "pairingCode")]
    pub pairing_code: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    /// Imagem do QR em data-url base64
    #[serde(default)]
    pub base64: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
}

/// Estado de conexão de uma instância
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionState {
    pub instance_name: String,
    /// "open" (conectada), "connecting" ou "close"
    pub state: String,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        self.state == "open"
    }
}

impl InstanceManager {
    /// Cria uma nova instância do InstanceManager
    pub fn new(client: EvolutionClient) -> Self {
        Self { client }
    }

    /// Cria um InstanceManager a partir de URL + apikey (conveniência)
    pub fn from_config(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self::new(EvolutionClient::new(base_url, api_key)?))
    }

    /// Lista todas as instâncias registradas no gateway
    ///
    /// `GET /instance/fetchInstances`
    pub async fn fetch_instances(&self) -> Result<Vec<InstanceInfo>> {
        let value: Value = self.client.get_json("/instance/fetchInstances").await?;

        // Versões antigas devolvem `[{"instance": {...}}]`, novas devolvem `[{...}]`
        let items = match value {
            Value::Array(items) => items,
            other => vec![other],
        };

        let mut instances = Vec::with_capacity(items.len());
        for item in items {
            let inner = item.get("instance").cloned().unwrap_or(item);
            let info: InstanceInfo = serde_json::from_value(inner)?;
            instances.push(info);
        }

        Ok(instances)
    }

    /// Cria uma nova instância no gateway
    ///
    /// `POST /instance/create`
    pub async fn create_instance(&self, request: &CreateInstanceRequest) -> Result<Value> {
        if request.instance_name.trim().is_empty() {
            return Err(EvolutionError::ValidationError(
                "instance_name não pode ser vazio".to_string(),
            ));
        }

        let mut body = json!({
            "instanceName": request.instance_name,
            "qrcode": request.qrcode,
        });
        if let Some(ref integration) = request.integration {
            body["integration"] = json!(integration);
        }

        let response = self.client.post_json("/instance/create", &body).await?;

        tracing::info!("✅ Instância '{}' criada no gateway", request.instance_name);

        Ok(response)
    }

    /// Obtém o QR code / pairing code para conectar a instância
    ///
    /// `GET /instance/connect/{name}`
    pub async fn connect(&self, instance_name: &str) -> Result<QrCode> {
        let endpoint = format!("/instance/connect/{}", urlencoding::encode(instance_name));
        let qr: QrCode = self.client.get_json(&endpoint).await?;
        Ok(qr)
    }

    /// Consulta o estado de conexão da instância
    ///
    /// `GET /instance/connectionState/{name}`
    pub async fn connection_state(&self, instance_name: &str) -> Result<ConnectionState> {
        let endpoint = format!(
            "/instance/connectionState/{}",
            urlencoding::encode(instance_name)
        );
        let value: Value = self.client.get_json(&endpoint).await?;

        // Resposta: {"instance": {"instanceName": "...", "state": "open"}}
        let state = value
            .pointer("/instance/state")
            .or_else(|| value.get("state"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| EvolutionError::InstanceNotFound(instance_name.to_string()))?
            .to_string();

        Ok(ConnectionState {
            instance_name: instance_name.to_string(),
            state,
        })
    }

    /// Desconecta a sessão WhatsApp da instância (mantém a instância)
    ///
    /// `DELETE /instance/logout/{name}`
    pub async fn logout(&self, instance_name: &str) -> Result<()> {
        let endpoint = format!("/instance/logout/{}", urlencoding::encode(instance_name));
        self.client.delete(&endpoint).await?;

        tracing::info!("Instância '{}' desconectada", instance_name);

        Ok(())
    }

    /// Remove a instância do gateway
    ///
    /// `DELETE /instance/delete/{name}`
    pub async fn delete_instance(&self, instance_name: &str) -> Result<()> {
        let endpoint = format!("/instance/delete/{}", urlencoding::encode(instance_name));
        self.client.delete(&endpoint).await?;

        tracing::info!("Instância '{}' removida do gateway", instance_name);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn manager(server: &MockServer) -> InstanceManager {
        InstanceManager::from_config(server.base_url(), "test-key").unwrap()
    }

    #[tokio::test]
    async fn test_fetch_instances_wrapped_format() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/instance/fetchInstances")
                .header("apikey", "test-key");
            then.status(200).json_body(serde_json::json!([
                {"instance": {"instanceName": "vendas", "status": "open"}}
            ]));
        });

        let instances = manager(&server).fetch_instances().await.unwrap();

        mock.assert();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].instance_name.as_deref(), Some("vendas"));
        assert_eq!(instances[0].connection_status.as_deref(), Some("open"));
    }

    #[tokio::test]
    async fn test_connection_state() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/instance/connectionState/vendas");
            then.status(200).json_body(serde_json::json!({
                "instance": {"instanceName": "vendas", "state": "open"}
            }));
        });

        let state = manager(&server).connection_state("vendas").await.unwrap();
        assert!(state.is_connected());
    }

    #[tokio::test]
    async fn test_create_instance_rejects_empty_name() {
        let server = MockServer::start();
        let request = CreateInstanceRequest::new("  ");
        let err = manager(&server).create_instance(&request).await.unwrap_err();
        assert!(matches!(err, EvolutionError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_api_error_extracts_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/instance/connect/fantasma");
            then.status(404).json_body(serde_json::json!({
                "response": {"message": "Instance not found"}
            }));
        });

        let err = manager(&server).connect("fantasma").await.unwrap_err();
        match err {
            EvolutionError::ApiError { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("Instance not found"));
            }
            other => panic!("Unexpected error: {:?}", other),
        }
    }
}
