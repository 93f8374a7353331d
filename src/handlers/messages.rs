/// Handler de envio direto de mensagem (fora do fluxo de lembretes)

use axum::{extract::State, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use evolution_crm_backend::utils::logging::*;
use evolution_crm_backend::utils::{normalize_phone, AppError, AppResult};
use evolution_crm_backend::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Instância a usar; cai na padrão das settings quando ausente
    pub instance: Option<String>,
    pub phone: String,
    pub message: String,
}

/// POST /api/messages/send
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SendMessageRequest>,
) -> AppResult<Json<Value>> {
    log_request_received("/api/messages/send", "POST");

    if body.message.trim().is_empty() {
        return Err(AppError::ValidationError("message é obrigatória".to_string()));
    }

    let number = normalize_phone(&body.phone).ok_or_else(|| {
        log_validation_error("phone", &body.phone);
        AppError::ValidationError(format!("Telefone inválido: '{}'", body.phone))
    })?;

    let instance = state.whatsapp.resolve_instance(body.instance.as_deref())?;

    let response = state
        .whatsapp
        .send_text(&instance, &number, &body.message)
        .await?;

    Ok(Json(json!({
        "message": "Message sent",
        "instance": instance,
        "number": number,
        "gateway_response": response,
    })))
}
