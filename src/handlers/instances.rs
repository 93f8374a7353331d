/// Handlers de instâncias WhatsApp - proxy fino para o Evolution API
///
/// O estado das instâncias vive inteiramente no gateway; o CRM só repassa.
/// Erros do gateway viram 502 com a mensagem original.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use evolution_crm_backend::utils::logging::*;
use evolution_crm_backend::utils::{AppError, AppResult};
use evolution_crm_backend::AppState;

#[derive(Debug, Deserialize)]
pub struct NewInstance {
    pub instance_name: String,
}

/// GET /api/instances
pub async fn list_instances(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let instances = state.whatsapp.instances().fetch_instances().await?;

    Ok(Json(json!({
        "count": instances.len(),
        "instances": instances,
    })))
}

/// POST /api/instances
pub async fn create_instance(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewInstance>,
) -> AppResult<Json<Value>> {
    log_request_received("/api/instances", "POST");

    let name = body.instance_name.trim();
    if name.is_empty() {
        return Err(AppError::ValidationError(
            "instance_name é obrigatório".to_string(),
        ));
    }

    let created = state.whatsapp.create_instance(name).await?;

    Ok(Json(json!({
        "message": "Instance created",
        "instance": created,
    })))
}

/// GET /api/instances/:name/connect - QR code / pairing code
pub async fn connect_instance(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<Value>> {
    let qr = state.whatsapp.connect(&name).await?;

    Ok(Json(json!({
        "instance_name": name,
        "qrcode": qr,
    })))
}

/// GET /api/instances/:name/state
pub async fn instance_state(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<Value>> {
    let connection = state.whatsapp.instances().connection_state(&name).await?;

    Ok(Json(json!({
        "instance_name": connection.instance_name,
        "state": connection.state,
        "connected": connection.is_connected(),
    })))
}

/// POST /api/instances/:name/logout
pub async fn logout_instance(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<Value>> {
    state.whatsapp.instances().logout(&name).await?;

    Ok(Json(json!({"message": "Instance logged out"})))
}

/// DELETE /api/instances/:name
pub async fn delete_instance(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<Value>> {
    state.whatsapp.instances().delete_instance(&name).await?;

    log_info(&format!("🗑️ Instância '{}' removida", name));

    Ok(Json(json!({"message": "Instance deleted"})))
}
