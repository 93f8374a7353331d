/// Serviço de WhatsApp sobre o crate `evolution`
///
/// Centraliza o cliente do gateway (instâncias + mensagens) configurado a
/// partir das settings, do mesmo jeito que os handlers e o verificador de
/// recorrência esperam consumir.

use evolution::{
    CreateInstanceRequest, EvolutionClient, InstanceManager, MessageManager, QrCode,
    SendTextResponse,
};

use crate::config::settings::EvolutionSettings;
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct WhatsAppService {
    instances: InstanceManager,
    messages: MessageManager,
    default_instance: Option<String>,
}

impl WhatsAppService {
    pub fn new(settings: &EvolutionSettings) -> AppResult<Self> {
        let client = EvolutionClient::new(&settings.base_url, &settings.api_key)
            .map_err(|e| AppError::ConfigError(format!("Failed to create Evolution client: {}", e)))?;

        Ok(Self {
            instances: InstanceManager::new(client.clone()),
            messages: MessageManager::new(client),
            default_instance: settings.default_instance.clone(),
        })
    }

    pub fn instances(&self) -> &InstanceManager {
        &self.instances
    }

    /// Resolve a instância a usar: a pedida ou a padrão das settings
    pub fn resolve_instance(&self, requested: Option<&str>) -> AppResult<String> {
        requested
            .map(|s| s.to_string())
            .or_else(|| self.default_instance.clone())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                AppError::ValidationError(
                    "Nenhuma instância informada e nenhuma instância padrão configurada"
                        .to_string(),
                )
            })
    }

    /// Cria uma instância no gateway
    pub async fn create_instance(&self, name: &str) -> AppResult<serde_json::Value> {
        let request = CreateInstanceRequest::new(name);
        Ok(self.instances.create_instance(&request).await?)
    }

    /// QR code de conexão
    pub async fn connect(&self, name: &str) -> AppResult<QrCode> {
        Ok(self.instances.connect(name).await?)
    }

    /// Envia texto por uma instância (número já normalizado)
    pub async fn send_text(
        &self,
        instance: &str,
        number: &str,
        text: &str,
    ) -> AppResult<SendTextResponse> {
        Ok(self.messages.send_text(instance, number, text).await?)
    }

    /// Ping no gateway, usado pelo /ready
    pub async fn check_gateway(&self) -> bool {
        self.instances.fetch_instances().await.is_ok()
    }
}
