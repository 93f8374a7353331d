/// Handlers dos leads do pipeline
///
/// O telefone é normalizado (apenas dígitos, DDI aplicado) antes de
/// persistir, então o verificador de lembretes pode enviar direto.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use evolution_crm_backend::models::{Lead, LeadFilter, MoveLead, NewLead, UpdateLead};
use evolution_crm_backend::utils::logging::*;
use evolution_crm_backend::utils::{normalize_phone, AppError, AppResult};
use evolution_crm_backend::AppState;

const LEAD_COLUMNS: &str =
    "id, name, phone, email, notes, stage_id, position, created_at, updated_at";

/// GET /api/leads?stage_id=
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<LeadFilter>,
) -> AppResult<Json<Vec<Lead>>> {
    let leads = sqlx::query_as::<_, Lead>(&format!(
        "SELECT {}
         FROM leads
         WHERE ($1::uuid IS NULL OR stage_id = $1)
         ORDER BY stage_id, position",
        LEAD_COLUMNS
    ))
    .bind(filter.stage_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(leads))
}

/// POST /api/leads - novo lead no fim da coluna
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewLead>,
) -> AppResult<Json<Lead>> {
    log_request_received("/api/leads", "POST");

    if body.name.trim().is_empty() {
        return Err(AppError::ValidationError("name é obrigatório".to_string()));
    }

    let phone = normalize_phone(&body.phone).ok_or_else(|| {
        log_validation_error("phone", &body.phone);
        AppError::ValidationError(format!("Telefone inválido: '{}'", body.phone))
    })?;

    let stage_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM stages WHERE id = $1)")
        .bind(body.stage_id)
        .fetch_one(&state.db)
        .await?;
    if !stage_exists {
        return Err(AppError::NotFound(format!("Stage {} não existe", body.stage_id)));
    }

    let lead = sqlx::query_as::<_, Lead>(&format!(
        "INSERT INTO leads (name, phone, email, notes, stage_id, position)
         VALUES ($1, $2, $3, $4, $5,
                 (SELECT COALESCE(MAX(position) + 1, 0) FROM leads WHERE stage_id = $5))
         RETURNING {}",
        LEAD_COLUMNS
    ))
    .bind(body.name.trim())
    .bind(&phone)
    .bind(body.email.as_deref())
    .bind(body.notes.as_deref())
    .bind(body.stage_id)
    .fetch_one(&state.db)
    .await?;

    log_info(&format!("✅ Lead '{}' criado ({})", lead.name, lead.phone));

    Ok(Json(lead))
}

/// GET /api/leads/:id
pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Lead>> {
    let lead = sqlx::query_as::<_, Lead>(&format!(
        "SELECT {} FROM leads WHERE id = $1",
        LEAD_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Lead {} não existe", id)))?;

    Ok(Json(lead))
}

/// PUT /api/leads/:id
pub async fn update_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateLead>,
) -> AppResult<Json<Lead>> {
    let phone = match body.phone.as_deref() {
        Some(raw) => Some(normalize_phone(raw).ok_or_else(|| {
            AppError::ValidationError(format!("Telefone inválido: '{}'", raw))
        })?),
        None => None,
    };

    let lead = sqlx::query_as::<_, Lead>(&format!(
        "UPDATE leads
         SET name = COALESCE($2, name),
             phone = COALESCE($3, phone),
             email = COALESCE($4, email),
             notes = COALESCE($5, notes),
             updated_at = NOW()
         WHERE id = $1
         RETURNING {}",
        LEAD_COLUMNS
    ))
    .bind(id)
    .bind(body.name.as_deref().map(str::trim))
    .bind(phone.as_deref())
    .bind(body.email.as_deref())
    .bind(body.notes.as_deref())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Lead {} não existe", id)))?;

    Ok(Json(lead))
}

/// DELETE /api/leads/:id
pub async fn delete_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM leads WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Lead {} não existe", id)));
    }

    Ok(Json(json!({"message": "Lead deleted"})))
}

/// PATCH /api/leads/:id/stage - movimento de drag-and-drop no board
///
/// Abre espaço na posição destino (desloca os vizinhos) e move o lead.
pub async fn move_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<MoveLead>,
) -> AppResult<Json<Lead>> {
    if body.position < 0 {
        return Err(AppError::ValidationError("position não pode ser negativa".to_string()));
    }

    let stage_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM stages WHERE id = $1)")
        .bind(body.stage_id)
        .fetch_one(&state.db)
        .await?;
    if !stage_exists {
        return Err(AppError::NotFound(format!("Stage {} não existe", body.stage_id)));
    }

    let mut tx = state.db.begin().await?;

    sqlx::query(
        "UPDATE leads SET position = position + 1
         WHERE stage_id = $1 AND position >= $2 AND id != $3",
    )
    .bind(body.stage_id)
    .bind(body.position)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let lead = sqlx::query_as::<_, Lead>(&format!(
        "UPDATE leads
         SET stage_id = $2, position = $3, updated_at = NOW()
         WHERE id = $1
         RETURNING {}",
        LEAD_COLUMNS
    ))
    .bind(id)
    .bind(body.stage_id)
    .bind(body.position)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Lead {} não existe", id)))?;

    tx.commit().await?;

    log_info(&format!(
        "↔️ Lead '{}' movido para stage {} (posição {})",
        lead.name, body.stage_id, body.position
    ));

    Ok(Json(lead))
}
