use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lead do pipeline (linha da tabela `leads`)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    /// Telefone normalizado (apenas dígitos, com DDI)
    pub phone: String,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub stage_id: Uuid,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewLead {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub stage_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLead {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

/// Movimento de drag-and-drop no board: nova coluna + posição nela
#[derive(Debug, Deserialize)]
pub struct MoveLead {
    pub stage_id: Uuid,
    pub position: i32,
}

#[derive(Debug, Deserialize)]
pub struct LeadFilter {
    pub stage_id: Option<Uuid>,
}
