use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Coluna do Kanban (linha da tabela `stages`)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Stage {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewStage {
    pub name: String,
    #[serde(default = "default_stage_color")]
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStage {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Reordenação do board: lista completa de ids na nova ordem
#[derive(Debug, Deserialize)]
pub struct ReorderStages {
    pub stage_ids: Vec<Uuid>,
}

fn default_stage_color() -> String {
    "#6b7280".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stage_default_color() {
        let stage: NewStage = serde_json::from_str(r#"{"name": "Novo"}"#).unwrap();
        assert_eq!(stage.color, "#6b7280");
    }
}
