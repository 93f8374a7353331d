/// Verificador de recorrência: a passada que envia lembretes vencidos
///
/// O trabalho é o mesmo chamado de dois lugares:
/// - `POST /api/recurrence/check` (cron externo re-invoca)
/// - loop interno opcional de intervalo (settings `scheduler.enabled`)
///
/// Cada passada: busca lembretes `pending` vencidos, renderiza a mensagem,
/// envia pelo gateway e registra o resultado. Lembretes recorrentes são
/// re-armados (próximo disparo = agora + intervalo, ciclo incrementado no
/// tracker); one-shot viram `sent`. Falhas contam tentativas até virar
/// `failed`.

use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval, Duration};

use chrono::Utc;

use crate::config::settings::SchedulerSettings;
use crate::models::{compute_next_trigger, CheckOutcome, DueReminder};
use crate::services::{ReminderService, WhatsAppService};
use crate::utils::logging::*;
use crate::utils::{normalize_phone, AppResult};

#[derive(Clone)]
pub struct ReminderManager {
    reminders: ReminderService,
    whatsapp: WhatsAppService,
    settings: SchedulerSettings,
    running: Arc<RwLock<bool>>,
}

impl ReminderManager {
    pub fn new(
        reminders: ReminderService,
        whatsapp: WhatsAppService,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            reminders,
            whatsapp,
            settings,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Executa uma passada do verificador
    pub async fn run_check_pass(&self) -> AppResult<CheckOutcome> {
        let due = self.reminders.fetch_due(self.settings.batch_size).await?;

        if due.is_empty() {
            return Ok(CheckOutcome::default());
        }

        log_info(&format!("🔍 Verificando {} lembrete(s) vencido(s)", due.len()));

        let mut outcome = CheckOutcome::default();

        for reminder in &due {
            outcome.processed += 1;

            match self.process_one(reminder).await {
                Ok(rearmed) => {
                    outcome.sent += 1;
                    if rearmed {
                        outcome.rearmed += 1;
                    }
                }
                Err(e) => {
                    outcome.failed += 1;
                    log_reminder_failed(
                        &reminder.id.to_string(),
                        &reminder.lead_name,
                        &e.to_string(),
                    );
                    if let Err(db_err) = self
                        .reminders
                        .record_failure(reminder, &e.to_string(), self.settings.max_attempts)
                        .await
                    {
                        // Falha de banco na própria contabilização: só loga,
                        // a próxima passada reprocessa o lembrete
                        log_error(&format!(
                            "Failed to record failure for reminder {}: {}",
                            reminder.id, db_err
                        ));
                    }
                }
            }
        }

        log_info(&format!(
            "✅ Passada concluída: {} processados, {} enviados, {} falharam, {} re-armados",
            outcome.processed, outcome.sent, outcome.failed, outcome.rearmed
        ));

        Ok(outcome)
    }

    /// Envia um lembrete e registra o resultado; retorna se foi re-armado
    async fn process_one(&self, reminder: &DueReminder) -> AppResult<bool> {
        let number = normalize_phone(&reminder.lead_phone).ok_or_else(|| {
            crate::utils::AppError::ValidationError(format!(
                "Telefone inválido no lead {}: '{}'",
                reminder.lead_id, reminder.lead_phone
            ))
        })?;

        let message = render_template(
            &reminder.message,
            &reminder.lead_name,
            &reminder.product_name,
            &number,
        );

        self.whatsapp
            .send_text(&reminder.instance_name, &number, &message)
            .await?;

        // Recorrente re-arma a partir de agora; one-shot finaliza.
        // Intervalo corrompido no banco degrada para one-shot em vez de
        // travar a passada inteira.
        let rearm_to = if reminder.recurring {
            match compute_next_trigger(Utc::now(), reminder.delay_value, &reminder.delay_unit) {
                Ok(next) => Some(next),
                Err(e) => {
                    log_warning(&format!(
                        "⚠️ Lembrete {} com intervalo inválido ({}), finalizando como one-shot",
                        reminder.id, e
                    ));
                    None
                }
            }
        } else {
            None
        };

        let cycle = self.reminders.record_sent(reminder, rearm_to).await?;

        log_reminder_sent(
            &reminder.id.to_string(),
            &reminder.lead_name,
            &reminder.instance_name,
        );

        if let Some(next) = rearm_to {
            log_reminder_rearmed(&reminder.id.to_string(), &next.to_rfc3339(), cycle);
        }

        Ok(rearm_to.is_some())
    }

    /// Inicia o loop interno de verificação
    pub async fn start(&self) {
        let mut running = self.running.write().await;
        if *running {
            log_warning("Reminder check loop already running");
            return;
        }
        *running = true;
        drop(running);

        let manager = self.clone();

        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(manager.settings.interval_seconds));

            log_info(&format!(
                "✅ Reminder check loop iniciado (a cada {}s)",
                manager.settings.interval_seconds
            ));

            loop {
                interval.tick().await;

                let running = manager.running.read().await;
                if !*running {
                    break;
                }
                drop(running);

                if let Err(e) = manager.run_check_pass().await {
                    log_error(&format!("Reminder check pass failed: {}", e));
                }
            }

            log_info("Reminder check loop stopped");
        });
    }

    /// Para o loop interno
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
    }
}

/// Renderiza os placeholders do template de mensagem
///
/// Aceitos: `{{nome}}` (lead), `{{produto}}` e `{{telefone}}`.
pub fn render_template(template: &str, lead_name: &str, product_name: &str, phone: &str) -> String {
    template
        .replace("{{nome}}", lead_name)
        .replace("{{produto}}", product_name)
        .replace("{{telefone}}", phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template_replaces_placeholders() {
        let rendered = render_template(
            "Oi {{nome}}, seu {{produto}} está vencendo!",
            "Maria",
            "Plano Mensal",
            "5511999998888",
        );
        assert_eq!(rendered, "Oi Maria, seu Plano Mensal está vencendo!");
    }

    #[test]
    fn test_render_template_repeated_placeholder() {
        let rendered = render_template("{{nome}} {{nome}}", "Ana", "X", "1");
        assert_eq!(rendered, "Ana Ana");
    }

    #[test]
    fn test_render_template_without_placeholders() {
        let rendered = render_template("Mensagem fixa", "Ana", "X", "1");
        assert_eq!(rendered, "Mensagem fixa");
    }
}
