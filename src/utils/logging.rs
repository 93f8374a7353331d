use tracing::{info, warn, error, debug};

pub fn log_request_received(endpoint: &str, method: &str) {
    info!("Request received: {} {}", method, endpoint);
}

pub fn log_request_processed(endpoint: &str, status: u16, duration_ms: u64) {
    info!("Request processed: {} - Status: {} - Duration: {}ms",
          endpoint, status, duration_ms);
}

pub fn log_reminder_sent(reminder_id: &str, lead_name: &str, instance: &str) {
    info!("📤 Reminder {} sent to {} via instance '{}'", reminder_id, lead_name, instance);
}

pub fn log_reminder_failed(reminder_id: &str, lead_name: &str, error: &str) {
    error!("❌ Reminder {} failed for {}: {}", reminder_id, lead_name, error);
}

pub fn log_reminder_rearmed(reminder_id: &str, next_trigger: &str, cycle: i32) {
    info!("🔁 Reminder {} re-armed for {} (cycle {})", reminder_id, next_trigger, cycle);
}

#[allow(dead_code)]
pub fn log_evolution_api_error(endpoint: &str, status: Option<u16>, error: &str) {
    error!("Evolution API error: {} - Status: {:?} - Error: {}", endpoint, status, error);
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_server_startup(port: u16) {
    info!("🚀 Evolution CRM backend starting on port {}", port);
}

pub fn log_server_ready(port: u16) {
    info!("✅ Server ready and listening on http://0.0.0.0:{}", port);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

pub fn log_validation_error(field: &str, message: &str) {
    warn!("Validation error: {} - {}", field, message);
}

pub fn log_info(message: &str) {
    info!("{}", message);
}

pub fn log_error(message: &str) {
    error!("{}", message);
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}
