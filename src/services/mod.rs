pub mod reminder_manager;
pub mod reminder_service;
pub mod session;
pub mod whatsapp;

pub use reminder_manager::{render_template, ReminderManager};
pub use reminder_service::ReminderService;
pub use session::SessionService;
pub use whatsapp::WhatsAppService;
