use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use evolution_crm_backend::utils::logging::*;
use evolution_crm_backend::AppState;

pub async fn health_check() -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "service": "evolution-crm-backend",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn ready_check(State(state): State<Arc<AppState>>) -> Result<Json<Value>, StatusCode> {
    // Testa a conexão com o banco
    let database_status = match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
    {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    // Testa o gateway Evolution
    let gateway_status = if state.whatsapp.check_gateway().await {
        "connected"
    } else {
        "disconnected"
    };

    let overall_ready = database_status == "connected";

    let response = json!({
        "ready": overall_ready,
        "service": "evolution-crm-backend",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "dependencies": {
            "database": {
                "status": database_status
            },
            "evolution": {
                "status": gateway_status,
                "base_url": state.settings.evolution.base_url
            }
        }
    });

    if overall_ready {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

pub async fn status_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let evolution_configured = !state.settings.evolution.base_url.is_empty()
        && !state.settings.evolution.api_key.is_empty();

    let mut evolution_info = json!({
        "configured": evolution_configured,
        "base_url": state.settings.evolution.base_url,
        "default_instance": state.settings.evolution.default_instance,
    });

    if evolution_configured {
        match state.whatsapp.instances().fetch_instances().await {
            Ok(instances) => {
                evolution_info["connection"] = json!("success");
                evolution_info["instance_count"] = json!(instances.len());
            }
            Err(e) => {
                evolution_info["connection"] = json!("failed");
                evolution_info["error"] = json!(e.to_string());
            }
        }
    } else {
        evolution_info["connection"] = json!("not_configured");
    }

    Json(json!({
        "service": "evolution-crm-backend",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()),
        "integrations": {
            "evolution": evolution_info,
            "scheduler": {
                "internal_loop": state.settings.scheduler.enabled,
                "interval_seconds": state.settings.scheduler.interval_seconds,
                "batch_size": state.settings.scheduler.batch_size
            }
        }
    }))
}
