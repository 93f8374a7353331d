// Biblioteca do backend CRM
// Expõe módulos para uso em testes e binários

pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

// AppState é definido aqui para ser compartilhado
#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub db: sqlx::PgPool,
    pub sessions: services::SessionService,
    pub whatsapp: services::WhatsAppService,
    pub reminders: services::ReminderService,
    pub reminder_manager: services::ReminderManager,
}
