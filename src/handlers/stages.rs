/// Handlers das colunas do Kanban (stages)

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use evolution_crm_backend::models::{NewStage, ReorderStages, Stage, UpdateStage};
use evolution_crm_backend::utils::logging::*;
use evolution_crm_backend::utils::{AppError, AppResult};
use evolution_crm_backend::AppState;

/// GET /api/stages - colunas na ordem do board
pub async fn list_stages(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Stage>>> {
    let stages = sqlx::query_as::<_, Stage>(
        "SELECT id, name, color, position, created_at FROM stages ORDER BY position",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(stages))
}

/// POST /api/stages - nova coluna no fim do board
pub async fn create_stage(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewStage>,
) -> AppResult<Json<Stage>> {
    log_request_received("/api/stages", "POST");

    if body.name.trim().is_empty() {
        return Err(AppError::ValidationError("name é obrigatório".to_string()));
    }

    let stage = sqlx::query_as::<_, Stage>(
        "INSERT INTO stages (name, color, position)
         VALUES ($1, $2, (SELECT COALESCE(MAX(position) + 1, 0) FROM stages))
         RETURNING id, name, color, position, created_at",
    )
    .bind(body.name.trim())
    .bind(&body.color)
    .fetch_one(&state.db)
    .await?;

    log_info(&format!("✅ Stage '{}' criado", stage.name));

    Ok(Json(stage))
}

/// PUT /api/stages/:id - renomear / recolorir
pub async fn update_stage(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStage>,
) -> AppResult<Json<Stage>> {
    if let Some(ref name) = body.name {
        if name.trim().is_empty() {
            return Err(AppError::ValidationError("name não pode ser vazio".to_string()));
        }
    }

    let stage = sqlx::query_as::<_, Stage>(
        "UPDATE stages
         SET name = COALESCE($2, name), color = COALESCE($3, color)
         WHERE id = $1
         RETURNING id, name, color, position, created_at",
    )
    .bind(id)
    .bind(body.name.as_deref().map(str::trim))
    .bind(body.color.as_deref())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Stage {} não existe", id)))?;

    Ok(Json(stage))
}

/// DELETE /api/stages/:id
///
/// Os leads da coluna caem junto (cascade no banco).
pub async fn delete_stage(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM stages WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Stage {} não existe", id)));
    }

    log_info(&format!("🗑️ Stage {} removido (leads em cascata)", id));

    Ok(Json(json!({"message": "Stage deleted"})))
}

/// PUT /api/stages/reorder - nova ordem completa das colunas
pub async fn reorder_stages(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReorderStages>,
) -> AppResult<Json<Value>> {
    if body.stage_ids.is_empty() {
        return Err(AppError::ValidationError("stage_ids não pode ser vazio".to_string()));
    }

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stages")
        .fetch_one(&state.db)
        .await?;

    let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stages WHERE id = ANY($1)")
        .bind(&body.stage_ids)
        .fetch_one(&state.db)
        .await?;

    if known != body.stage_ids.len() as i64 || total != body.stage_ids.len() as i64 {
        return Err(AppError::ValidationError(
            "stage_ids deve conter exatamente os ids de todas as colunas".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;

    for (position, stage_id) in body.stage_ids.iter().enumerate() {
        sqlx::query("UPDATE stages SET position = $2 WHERE id = $1")
            .bind(stage_id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(Json(json!({"message": "Stages reordered"})))
}
