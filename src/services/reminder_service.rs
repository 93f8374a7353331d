/// Persistência dos lembretes agendados
///
/// Este serviço concentra todo o SQL do ciclo de vida de um lembrete:
///
/// 1. **Agendamento**: resolve o template do produto (ou os campos ad-hoc),
///    calcula o primeiro disparo e insere em `scheduled_reminders`
/// 2. **Máquina de status**: cancel/pause/resume com transição guardada
///    na própria query (um lembrete já enviado não pode ser cancelado)
/// 3. **Passada do verificador**: busca de vencidos, registro de resultado
///    em `reminder_logs` e ciclo em `lead_recurrence_tracker`

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    compute_next_trigger, DueReminder, NewReminder, ProductReminder, ReminderAction,
    ReminderFilter, ReminderLog, ReminderStatus, ScheduledReminder,
};
use crate::utils::logging::*;
use crate::utils::{AppError, AppResult};

const REMINDER_COLUMNS: &str =
    "id, lead_id, product_id, product_reminder_id, instance_name, message, status, \
     next_trigger_at, recurring, delay_value, delay_unit, attempts, created_at, updated_at";

#[derive(Clone)]
pub struct ReminderService {
    db: PgPool,
}

impl ReminderService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Agenda um lembrete para um par lead/produto
    ///
    /// Quando `product_reminder_id` é informado, intervalo e mensagem vêm
    /// do template do produto; ad-hoc exige `message` + `delay_value` +
    /// `delay_unit` no corpo.
    pub async fn schedule(
        &self,
        new: &NewReminder,
        instance_name: String,
    ) -> AppResult<ScheduledReminder> {
        // Lead e produto precisam existir (FKs dariam 500, queremos 404)
        let lead_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM leads WHERE id = $1)")
                .bind(new.lead_id)
                .fetch_one(&self.db)
                .await?;
        if !lead_exists {
            return Err(AppError::NotFound(format!("Lead {} não existe", new.lead_id)));
        }

        let product_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(new.product_id)
                .fetch_one(&self.db)
                .await?;
        if !product_exists {
            return Err(AppError::NotFound(format!(
                "Produto {} não existe",
                new.product_id
            )));
        }

        let (delay_value, delay_unit, message) = match new.product_reminder_id {
            Some(template_id) => {
                let template = sqlx::query_as::<_, ProductReminder>(
                    "SELECT id, product_id, delay_value, delay_unit, message_template, position, active
                     FROM product_reminders
                     WHERE id = $1 AND product_id = $2 AND active = true",
                )
                .bind(template_id)
                .bind(new.product_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "Template de lembrete {} não existe para este produto",
                        template_id
                    ))
                })?;

                (
                    template.delay_value,
                    template.delay_unit,
                    template.message_template,
                )
            }
            None => {
                let delay_value = new.delay_value.ok_or_else(|| {
                    AppError::ValidationError("delay_value é obrigatório sem template".to_string())
                })?;
                let delay_unit = new.delay_unit.clone().ok_or_else(|| {
                    AppError::ValidationError("delay_unit é obrigatório sem template".to_string())
                })?;
                let message = new.message.clone().ok_or_else(|| {
                    AppError::ValidationError("message é obrigatória sem template".to_string())
                })?;
                (delay_value, delay_unit, message)
            }
        };

        let next_trigger_at = compute_next_trigger(Utc::now(), delay_value, &delay_unit)
            .map_err(AppError::ValidationError)?;

        let reminder = sqlx::query_as::<_, ScheduledReminder>(&format!(
            "INSERT INTO scheduled_reminders
                 (lead_id, product_id, product_reminder_id, instance_name, message,
                  status, next_trigger_at, recurring, delay_value, delay_unit)
             VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, $8, $9)
             RETURNING {}",
            REMINDER_COLUMNS
        ))
        .bind(new.lead_id)
        .bind(new.product_id)
        .bind(new.product_reminder_id)
        .bind(&instance_name)
        .bind(&message)
        .bind(next_trigger_at)
        .bind(new.recurring)
        .bind(delay_value)
        .bind(&delay_unit)
        .fetch_one(&self.db)
        .await?;

        log_info(&format!(
            "📅 Lembrete {} agendado para {} (lead {})",
            reminder.id,
            next_trigger_at.to_rfc3339(),
            new.lead_id
        ));

        Ok(reminder)
    }

    pub async fn list(&self, filter: &ReminderFilter) -> AppResult<Vec<ScheduledReminder>> {
        if let Some(ref status) = filter.status {
            // Valida o filtro antes de mandar pro banco
            status
                .parse::<ReminderStatus>()
                .map_err(AppError::ValidationError)?;
        }

        let reminders = sqlx::query_as::<_, ScheduledReminder>(&format!(
            "SELECT {}
             FROM scheduled_reminders
             WHERE ($1::text IS NULL OR status = $1)
               AND ($2::uuid IS NULL OR lead_id = $2)
             ORDER BY next_trigger_at
             LIMIT 500",
            REMINDER_COLUMNS
        ))
        .bind(filter.status.as_deref())
        .bind(filter.lead_id)
        .fetch_all(&self.db)
        .await?;

        Ok(reminders)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ScheduledReminder> {
        sqlx::query_as::<_, ScheduledReminder>(&format!(
            "SELECT {} FROM scheduled_reminders WHERE id = $1",
            REMINDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Lembrete {} não existe", id)))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM scheduled_reminders WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Lembrete {} não existe", id)));
        }

        Ok(())
    }

    /// Aplica cancel/pause/resume respeitando a máquina de status
    ///
    /// A transição é guardada na própria query (`WHERE status IN (...)`);
    /// quando nada é atualizado, distinguimos 404 de 409 consultando a linha.
    pub async fn apply_action(
        &self,
        id: Uuid,
        action: ReminderAction,
    ) -> AppResult<ScheduledReminder> {
        let updated = match action {
            ReminderAction::Cancel => {
                sqlx::query_as::<_, ScheduledReminder>(&format!(
                    "UPDATE scheduled_reminders
                     SET status = 'cancelled', updated_at = NOW()
                     WHERE id = $1 AND status IN ('pending', 'paused')
                     RETURNING {}",
                    REMINDER_COLUMNS
                ))
                .bind(id)
                .fetch_optional(&self.db)
                .await?
            }
            ReminderAction::Pause => {
                sqlx::query_as::<_, ScheduledReminder>(&format!(
                    "UPDATE scheduled_reminders
                     SET status = 'paused', updated_at = NOW()
                     WHERE id = $1 AND status = 'pending'
                     RETURNING {}",
                    REMINDER_COLUMNS
                ))
                .bind(id)
                .fetch_optional(&self.db)
                .await?
            }
            ReminderAction::Resume => {
                // Resume volta para pending e re-arma o disparo a partir de agora,
                // senão um lembrete pausado por semanas dispararia na hora
                sqlx::query_as::<_, ScheduledReminder>(&format!(
                    "UPDATE scheduled_reminders
                     SET status = 'pending',
                         next_trigger_at = NOW() + (delay_value::text || ' ' || delay_unit)::interval,
                         attempts = 0,
                         updated_at = NOW()
                     WHERE id = $1 AND status = 'paused'
                     RETURNING {}",
                    REMINDER_COLUMNS
                ))
                .bind(id)
                .fetch_optional(&self.db)
                .await?
            }
        };

        match updated {
            Some(reminder) => Ok(reminder),
            None => {
                let current = self.get(id).await?;
                Err(AppError::Conflict(format!(
                    "Ação não permitida: lembrete está '{}'",
                    current.status
                )))
            }
        }
    }

    /// Busca lembretes vencidos com dados de lead/produto para envio
    pub async fn fetch_due(&self, limit: i64) -> AppResult<Vec<DueReminder>> {
        let due = sqlx::query_as::<_, DueReminder>(
            "SELECT r.id, r.lead_id, r.product_id, r.instance_name, r.message,
                    r.recurring, r.delay_value, r.delay_unit, r.attempts,
                    l.name AS lead_name, l.phone AS lead_phone, p.name AS product_name
             FROM scheduled_reminders r
             JOIN leads l ON l.id = r.lead_id
             JOIN products p ON p.id = r.product_id
             WHERE r.status = 'pending' AND r.next_trigger_at <= NOW()
             ORDER BY r.next_trigger_at
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(due)
    }

    /// Registra envio bem-sucedido
    ///
    /// Em uma transação: incrementa o ciclo no tracker, grava o log e
    /// re-arma (recorrente) ou finaliza (one-shot) o lembrete.
    pub async fn record_sent(
        &self,
        due: &DueReminder,
        rearm_to: Option<DateTime<Utc>>,
    ) -> AppResult<i32> {
        let mut tx = self.db.begin().await?;

        // O tracker guarda o próximo vencimento; para one-shot fica o próprio NOW()
        let next_date = rearm_to.unwrap_or_else(Utc::now);

        let cycle: i32 = sqlx::query_scalar(
            "INSERT INTO lead_recurrence_tracker
                 (lead_id, product_id, cycle_count, last_sent_at, next_reminder_date)
             VALUES ($1, $2, 1, NOW(), $3)
             ON CONFLICT (lead_id, product_id) DO UPDATE SET
                 cycle_count = lead_recurrence_tracker.cycle_count + 1,
                 last_sent_at = NOW(),
                 next_reminder_date = $3
             RETURNING cycle_count",
        )
        .bind(due.lead_id)
        .bind(due.product_id)
        .bind(next_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO reminder_logs (reminder_id, lead_id, product_id, outcome, cycle)
             VALUES ($1, $2, $3, 'sent', $4)",
        )
        .bind(due.id)
        .bind(due.lead_id)
        .bind(due.product_id)
        .bind(cycle)
        .execute(&mut *tx)
        .await?;

        match rearm_to {
            Some(next) => {
                sqlx::query(
                    "UPDATE scheduled_reminders
                     SET next_trigger_at = $2, attempts = 0, updated_at = NOW()
                     WHERE id = $1 AND status = 'pending'",
                )
                .bind(due.id)
                .bind(next)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query(
                    "UPDATE scheduled_reminders
                     SET status = 'sent', updated_at = NOW()
                     WHERE id = $1 AND status = 'pending'",
                )
                .bind(due.id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        Ok(cycle)
    }

    /// Registra falha de envio
    ///
    /// Incrementa `attempts`; ao atingir `max_attempts` o lembrete vira
    /// `failed`, senão continua `pending` e a próxima passada tenta de novo.
    pub async fn record_failure(
        &self,
        due: &DueReminder,
        detail: &str,
        max_attempts: i32,
    ) -> AppResult<ReminderStatus> {
        let mut tx = self.db.begin().await?;

        let cycle: i32 = sqlx::query_scalar(
            "SELECT COALESCE(
                 (SELECT cycle_count FROM lead_recurrence_tracker
                  WHERE lead_id = $1 AND product_id = $2), 0)",
        )
        .bind(due.lead_id)
        .bind(due.product_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO reminder_logs (reminder_id, lead_id, product_id, outcome, detail, cycle)
             VALUES ($1, $2, $3, 'failed', $4, $5)",
        )
        .bind(due.id)
        .bind(due.lead_id)
        .bind(due.product_id)
        .bind(detail)
        .bind(cycle)
        .execute(&mut *tx)
        .await?;

        let attempts = due.attempts + 1;
        let new_status = if attempts >= max_attempts {
            ReminderStatus::Failed
        } else {
            ReminderStatus::Pending
        };

        sqlx::query(
            "UPDATE scheduled_reminders
             SET attempts = $2, status = $3, updated_at = NOW()
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(due.id)
        .bind(attempts)
        .bind(new_status.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(new_status)
    }

    /// Logs recentes, opcionalmente por lead
    pub async fn logs(&self, lead_id: Option<Uuid>) -> AppResult<Vec<ReminderLog>> {
        let logs = sqlx::query_as::<_, ReminderLog>(
            "SELECT id, reminder_id, lead_id, product_id, outcome, detail, cycle, logged_at
             FROM reminder_logs
             WHERE ($1::uuid IS NULL OR lead_id = $1)
             ORDER BY logged_at DESC
             LIMIT 200",
        )
        .bind(lead_id)
        .fetch_all(&self.db)
        .await?;

        Ok(logs)
    }
}
