/// Handlers do catálogo de produtos e seus templates de lembrete

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use evolution_crm_backend::models::{
    DelayUnit, NewProduct, NewProductReminder, Product, ProductReminder, UpdateProduct,
    UpdateProductReminder,
};
use evolution_crm_backend::utils::logging::*;
use evolution_crm_backend::utils::{AppError, AppResult};
use evolution_crm_backend::AppState;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, recurring, recurrence_value, recurrence_unit, active, created_at";

const TEMPLATE_COLUMNS: &str =
    "id, product_id, delay_value, delay_unit, message_template, position, active";

/// Valida o par valor/unidade de recorrência
fn validate_recurrence(value: Option<i32>, unit: Option<&str>, recurring: bool) -> AppResult<()> {
    if !recurring {
        return Ok(());
    }

    let value = value.ok_or_else(|| {
        AppError::ValidationError("recurrence_value é obrigatório para produto recorrente".to_string())
    })?;
    if value <= 0 {
        return Err(AppError::ValidationError(
            "recurrence_value deve ser positivo".to_string(),
        ));
    }

    let unit = unit.ok_or_else(|| {
        AppError::ValidationError("recurrence_unit é obrigatória para produto recorrente".to_string())
    })?;
    DelayUnit::from_str(unit).map_err(AppError::ValidationError)?;

    Ok(())
}

/// GET /api/products
pub async fn list_products(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Product>>> {
    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products ORDER BY name",
        PRODUCT_COLUMNS
    ))
    .fetch_all(&state.db)
    .await?;

    Ok(Json(products))
}

/// POST /api/products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewProduct>,
) -> AppResult<Json<Product>> {
    log_request_received("/api/products", "POST");

    if body.name.trim().is_empty() {
        return Err(AppError::ValidationError("name é obrigatório".to_string()));
    }
    if body.price < 0.0 {
        return Err(AppError::ValidationError("price não pode ser negativo".to_string()));
    }
    validate_recurrence(body.recurrence_value, body.recurrence_unit.as_deref(), body.recurring)?;

    let product = sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products (name, description, price, recurring, recurrence_value, recurrence_unit)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {}",
        PRODUCT_COLUMNS
    ))
    .bind(body.name.trim())
    .bind(body.description.as_deref())
    .bind(body.price)
    .bind(body.recurring)
    .bind(body.recurrence_value)
    .bind(body.recurrence_unit.as_deref())
    .fetch_one(&state.db)
    .await?;

    log_info(&format!("✅ Produto '{}' criado", product.name));

    Ok(Json(product))
}

/// GET /api/products/:id
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products WHERE id = $1",
        PRODUCT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Produto {} não existe", id)))?;

    Ok(Json(product))
}

/// PUT /api/products/:id
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProduct>,
) -> AppResult<Json<Product>> {
    if let Some(price) = body.price {
        if price < 0.0 {
            return Err(AppError::ValidationError("price não pode ser negativo".to_string()));
        }
    }
    if let Some(ref unit) = body.recurrence_unit {
        DelayUnit::from_str(unit).map_err(AppError::ValidationError)?;
    }
    if let Some(value) = body.recurrence_value {
        if value <= 0 {
            return Err(AppError::ValidationError(
                "recurrence_value deve ser positivo".to_string(),
            ));
        }
    }

    let product = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products
         SET name = COALESCE($2, name),
             description = COALESCE($3, description),
             price = COALESCE($4, price),
             recurring = COALESCE($5, recurring),
             recurrence_value = COALESCE($6, recurrence_value),
             recurrence_unit = COALESCE($7, recurrence_unit),
             active = COALESCE($8, active)
         WHERE id = $1
         RETURNING {}",
        PRODUCT_COLUMNS
    ))
    .bind(id)
    .bind(body.name.as_deref().map(str::trim))
    .bind(body.description.as_deref())
    .bind(body.price)
    .bind(body.recurring)
    .bind(body.recurrence_value)
    .bind(body.recurrence_unit.as_deref())
    .bind(body.active)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Produto {} não existe", id)))?;

    Ok(Json(product))
}

/// DELETE /api/products/:id
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Produto {} não existe", id)));
    }

    Ok(Json(json!({"message": "Product deleted"})))
}

/// GET /api/products/:id/reminders - templates do produto
pub async fn list_product_reminders(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<ProductReminder>>> {
    let templates = sqlx::query_as::<_, ProductReminder>(&format!(
        "SELECT {} FROM product_reminders WHERE product_id = $1 ORDER BY position",
        TEMPLATE_COLUMNS
    ))
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(templates))
}

/// POST /api/products/:id/reminders
pub async fn create_product_reminder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<NewProductReminder>,
) -> AppResult<Json<ProductReminder>> {
    if body.delay_value <= 0 {
        return Err(AppError::ValidationError("delay_value deve ser positivo".to_string()));
    }
    DelayUnit::from_str(&body.delay_unit).map_err(AppError::ValidationError)?;
    if body.message_template.trim().is_empty() {
        return Err(AppError::ValidationError(
            "message_template é obrigatório".to_string(),
        ));
    }

    let product_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(id)
            .fetch_one(&state.db)
            .await?;
    if !product_exists {
        return Err(AppError::NotFound(format!("Produto {} não existe", id)));
    }

    let template = sqlx::query_as::<_, ProductReminder>(&format!(
        "INSERT INTO product_reminders (product_id, delay_value, delay_unit, message_template, position)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {}",
        TEMPLATE_COLUMNS
    ))
    .bind(id)
    .bind(body.delay_value)
    .bind(&body.delay_unit)
    .bind(&body.message_template)
    .bind(body.position)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(template))
}

/// PUT /api/reminder-templates/:id
pub async fn update_product_reminder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProductReminder>,
) -> AppResult<Json<ProductReminder>> {
    if let Some(value) = body.delay_value {
        if value <= 0 {
            return Err(AppError::ValidationError("delay_value deve ser positivo".to_string()));
        }
    }
    if let Some(ref unit) = body.delay_unit {
        DelayUnit::from_str(unit).map_err(AppError::ValidationError)?;
    }

    let template = sqlx::query_as::<_, ProductReminder>(&format!(
        "UPDATE product_reminders
         SET delay_value = COALESCE($2, delay_value),
             delay_unit = COALESCE($3, delay_unit),
             message_template = COALESCE($4, message_template),
             position = COALESCE($5, position),
             active = COALESCE($6, active)
         WHERE id = $1
         RETURNING {}",
        TEMPLATE_COLUMNS
    ))
    .bind(id)
    .bind(body.delay_value)
    .bind(body.delay_unit.as_deref())
    .bind(body.message_template.as_deref())
    .bind(body.position)
    .bind(body.active)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Template {} não existe", id)))?;

    Ok(Json(template))
}

/// DELETE /api/reminder-templates/:id
pub async fn delete_product_reminder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM product_reminders WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Template {} não existe", id)));
    }

    Ok(Json(json!({"message": "Reminder template deleted"})))
}
