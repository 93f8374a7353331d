/// Handlers dos lembretes agendados

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use evolution_crm_backend::models::{
    NewReminder, ReminderFilter, ReminderLog, ReminderPatch, ScheduledReminder,
};
use evolution_crm_backend::utils::logging::*;
use evolution_crm_backend::utils::AppResult;
use evolution_crm_backend::AppState;

/// GET /api/reminders?status=&lead_id=
pub async fn list_reminders(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ReminderFilter>,
) -> AppResult<Json<Vec<ScheduledReminder>>> {
    let reminders = state.reminders.list(&filter).await?;
    Ok(Json(reminders))
}

/// POST /api/reminders - agenda um lembrete (template do produto ou ad-hoc)
pub async fn create_reminder(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewReminder>,
) -> AppResult<Json<ScheduledReminder>> {
    log_request_received("/api/reminders", "POST");

    let instance = state
        .whatsapp
        .resolve_instance(body.instance_name.as_deref())?;

    let reminder = state.reminders.schedule(&body, instance).await?;

    Ok(Json(reminder))
}

/// GET /api/reminders/:id
pub async fn get_reminder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ScheduledReminder>> {
    let reminder = state.reminders.get(id).await?;
    Ok(Json(reminder))
}

/// PATCH /api/reminders/:id - {"action": "cancel" | "pause" | "resume"}
pub async fn patch_reminder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<ReminderPatch>,
) -> AppResult<Json<ScheduledReminder>> {
    let reminder = state.reminders.apply_action(id, body.action).await?;

    log_info(&format!("Lembrete {} agora está '{}'", id, reminder.status));

    Ok(Json(reminder))
}

/// DELETE /api/reminders/:id
pub async fn delete_reminder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.reminders.delete(id).await?;
    Ok(Json(json!({"message": "Reminder deleted"})))
}

#[derive(Debug, Deserialize)]
pub struct LogFilter {
    pub lead_id: Option<Uuid>,
}

/// GET /api/reminders/logs?lead_id=
pub async fn list_reminder_logs(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<LogFilter>,
) -> AppResult<Json<Vec<ReminderLog>>> {
    let logs = state.reminders.logs(filter.lead_id).await?;
    Ok(Json(logs))
}
