use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Produto/serviço do catálogo (linha da tabela `products`)
///
/// Produtos recorrentes carregam `recurrence_value`/`recurrence_unit`,
/// usados como ciclo padrão ao agendar lembretes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub recurring: bool,
    pub recurrence_value: Option<i32>,
    pub recurrence_unit: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub recurring: bool,
    pub recurrence_value: Option<i32>,
    pub recurrence_unit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub recurring: Option<bool>,
    pub recurrence_value: Option<i32>,
    pub recurrence_unit: Option<String>,
    pub active: Option<bool>,
}

/// Template de lembrete configurado por produto (tabela `product_reminders`)
///
/// O template de mensagem aceita os placeholders `{{nome}}`, `{{produto}}`
/// e `{{telefone}}`, renderizados no momento do envio.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductReminder {
    pub id: Uuid,
    pub product_id: Uuid,
    pub delay_value: i32,
    pub delay_unit: String,
    pub message_template: String,
    pub position: i32,
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct NewProductReminder {
    pub delay_value: i32,
    pub delay_unit: String,
    pub message_template: String,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductReminder {
    pub delay_value: Option<i32>,
    pub delay_unit: Option<String>,
    pub message_template: Option<String>,
    pub position: Option<i32>,
    pub active: Option<bool>,
}
