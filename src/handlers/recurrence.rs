/// Handler do verificador de recorrência
///
/// O cron externo chama este endpoint; o mesmo trabalho roda no loop
/// interno quando `scheduler.enabled` está ligado.

use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Instant;

use evolution_crm_backend::utils::logging::*;
use evolution_crm_backend::utils::AppResult;
use evolution_crm_backend::AppState;

/// POST /api/recurrence/check - executa uma passada de envio de lembretes
pub async fn recurrence_check(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let start_time = Instant::now();
    log_request_received("/api/recurrence/check", "POST");

    let outcome = state.reminder_manager.run_check_pass().await?;

    let processing_time = start_time.elapsed().as_millis() as u64;
    log_request_processed("/api/recurrence/check", 200, processing_time);

    Ok(Json(json!({
        "processed": outcome.processed,
        "sent": outcome.sent,
        "failed": outcome.failed,
        "rearmed": outcome.rearmed,
        "duration_ms": processing_time,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
