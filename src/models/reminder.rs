use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unidade do intervalo de um lembrete
///
/// Meses são aproximados para 30 dias, a mesma aritmética simples de
/// timestamp do CRM original (sem rolagem de calendário).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
}

impl DelayUnit {
    /// Converte valor + unidade em uma duração concreta
    pub fn to_duration(&self, value: i32) -> Duration {
        let value = value as i64;
        match self {
            DelayUnit::Minutes => Duration::minutes(value),
            DelayUnit::Hours => Duration::hours(value),
            DelayUnit::Days => Duration::days(value),
            DelayUnit::Weeks => Duration::weeks(value),
            DelayUnit::Months => Duration::days(value * 30),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DelayUnit::Minutes => "minutes",
            DelayUnit::Hours => "hours",
            DelayUnit::Days => "days",
            DelayUnit::Weeks => "weeks",
            DelayUnit::Months => "months",
        }
    }
}

impl FromStr for DelayUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minutes" | "minute" | "minutos" => Ok(DelayUnit::Minutes),
            "hours" | "hour" | "horas" => Ok(DelayUnit::Hours),
            "days" | "day" | "dias" => Ok(DelayUnit::Days),
            "weeks" | "week" | "semanas" => Ok(DelayUnit::Weeks),
            "months" | "month" | "meses" => Ok(DelayUnit::Months),
            other => Err(format!("Unidade de intervalo inválida: '{}'", other)),
        }
    }
}

impl fmt::Display for DelayUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calcula o próximo disparo a partir de um instante base
///
/// Retorna erro para valores não-positivos ou unidade desconhecida.
pub fn compute_next_trigger(
    base: DateTime<Utc>,
    delay_value: i32,
    delay_unit: &str,
) -> Result<DateTime<Utc>, String> {
    if delay_value <= 0 {
        return Err(format!("Intervalo deve ser positivo, recebido {}", delay_value));
    }
    let unit = DelayUnit::from_str(delay_unit)?;
    Ok(base + unit.to_duration(delay_value))
}

/// Status de um lembrete agendado
///
/// Máquina de estados: `pending` transita para `sent`, `failed`,
/// `cancelled` ou `paused`; `paused` volta para `pending` no resume.
/// `sent`, `failed` e `cancelled` são terminais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Pending,
    Sent,
    Failed,
    Cancelled,
    Paused,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Pending => "pending",
            ReminderStatus::Sent => "sent",
            ReminderStatus::Failed => "failed",
            ReminderStatus::Cancelled => "cancelled",
            ReminderStatus::Paused => "paused",
        }
    }

    /// Transições válidas da máquina de estados
    pub fn can_transition_to(&self, next: ReminderStatus) -> bool {
        matches!(
            (self, next),
            (
                ReminderStatus::Pending,
                ReminderStatus::Sent
                    | ReminderStatus::Failed
                    | ReminderStatus::Cancelled
                    | ReminderStatus::Paused
            ) | (ReminderStatus::Paused, ReminderStatus::Pending)
                | (ReminderStatus::Paused, ReminderStatus::Cancelled)
        )
    }
}

impl FromStr for ReminderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReminderStatus::Pending),
            "sent" => Ok(ReminderStatus::Sent),
            "failed" => Ok(ReminderStatus::Failed),
            "cancelled" => Ok(ReminderStatus::Cancelled),
            "paused" => Ok(ReminderStatus::Paused),
            other => Err(format!("Status de lembrete inválido: '{}'", other)),
        }
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lembrete agendado (linha da tabela `scheduled_reminders`)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduledReminder {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub product_id: Uuid,
    pub product_reminder_id: Option<Uuid>,
    pub instance_name: String,
    pub message: String,
    pub status: String,
    pub next_trigger_at: DateTime<Utc>,
    pub recurring: bool,
    pub delay_value: i32,
    pub delay_unit: String,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lembrete vencido, com os dados do lead/produto já juntados para envio
#[derive(Debug, Clone, FromRow)]
pub struct DueReminder {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub product_id: Uuid,
    pub instance_name: String,
    pub message: String,
    pub recurring: bool,
    pub delay_value: i32,
    pub delay_unit: String,
    pub attempts: i32,
    pub lead_name: String,
    pub lead_phone: String,
    pub product_name: String,
}

/// Agendamento de um novo lembrete
///
/// `product_reminder_id` aponta para um template do produto; quando
/// presente, delay e mensagem vêm do template. Ad-hoc exige os três campos.
#[derive(Debug, Deserialize)]
pub struct NewReminder {
    pub lead_id: Uuid,
    pub product_id: Uuid,
    pub product_reminder_id: Option<Uuid>,
    pub instance_name: Option<String>,
    pub message: Option<String>,
    pub delay_value: Option<i32>,
    pub delay_unit: Option<String>,
    #[serde(default)]
    pub recurring: bool,
}

/// Ação sobre um lembrete: PATCH /api/reminders/:id
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderAction {
    Cancel,
    Pause,
    Resume,
}

#[derive(Debug, Deserialize)]
pub struct ReminderPatch {
    pub action: ReminderAction,
}

#[derive(Debug, Deserialize)]
pub struct ReminderFilter {
    pub status: Option<String>,
    pub lead_id: Option<Uuid>,
}

/// Registro de resultado de envio (tabela `reminder_logs`)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReminderLog {
    pub id: Uuid,
    pub reminder_id: Uuid,
    pub lead_id: Uuid,
    pub product_id: Uuid,
    pub outcome: String,
    pub detail: Option<String>,
    pub cycle: i32,
    pub logged_at: DateTime<Utc>,
}

/// Ciclo de recorrência por par lead/produto (tabela `lead_recurrence_tracker`)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecurrenceTracker {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub product_id: Uuid,
    pub cycle_count: i32,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub next_reminder_date: DateTime<Utc>,
}

/// Resumo de uma passada do verificador de recorrência
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckOutcome {
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    pub rearmed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_unit_parsing() {
        assert_eq!(DelayUnit::from_str("days").unwrap(), DelayUnit::Days);
        assert_eq!(DelayUnit::from_str("Horas").unwrap(), DelayUnit::Hours);
        assert!(DelayUnit::from_str("fortnights").is_err());
    }

    #[test]
    fn test_delay_arithmetic() {
        let base = Utc::now();
        assert_eq!(
            compute_next_trigger(base, 15, "minutes").unwrap(),
            base + Duration::minutes(15)
        );
        assert_eq!(
            compute_next_trigger(base, 2, "weeks").unwrap(),
            base + Duration::days(14)
        );
        // Meses são 30 dias fixos
        assert_eq!(
            compute_next_trigger(base, 1, "months").unwrap(),
            base + Duration::days(30)
        );
    }

    #[test]
    fn test_next_trigger_rejects_invalid_input() {
        let base = Utc::now();
        assert!(compute_next_trigger(base, 0, "days").is_err());
        assert!(compute_next_trigger(base, -3, "days").is_err());
        assert!(compute_next_trigger(base, 1, "decades").is_err());
    }

    #[test]
    fn test_status_transitions_from_pending() {
        let pending = ReminderStatus::Pending;
        assert!(pending.can_transition_to(ReminderStatus::Sent));
        assert!(pending.can_transition_to(ReminderStatus::Failed));
        assert!(pending.can_transition_to(ReminderStatus::Cancelled));
        assert!(pending.can_transition_to(ReminderStatus::Paused));
        assert!(!pending.can_transition_to(ReminderStatus::Pending));
    }

    #[test]
    fn test_terminal_states_do_not_transition() {
        for terminal in [
            ReminderStatus::Sent,
            ReminderStatus::Failed,
            ReminderStatus::Cancelled,
        ] {
            for next in [
                ReminderStatus::Pending,
                ReminderStatus::Sent,
                ReminderStatus::Failed,
                ReminderStatus::Cancelled,
                ReminderStatus::Paused,
            ] {
                assert!(!terminal.can_transition_to(next), "{} -> {}", terminal, next);
            }
        }
    }

    #[test]
    fn test_paused_resumes_or_cancels() {
        let paused = ReminderStatus::Paused;
        assert!(paused.can_transition_to(ReminderStatus::Pending));
        assert!(paused.can_transition_to(ReminderStatus::Cancelled));
        assert!(!paused.can_transition_to(ReminderStatus::Sent));
    }

    #[test]
    fn test_status_roundtrip() {
        for status in ["pending", "sent", "failed", "cancelled", "paused"] {
            assert_eq!(ReminderStatus::from_str(status).unwrap().as_str(), status);
        }
    }
}
