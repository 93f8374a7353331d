/// Main Application: backend REST do CRM
///
/// Arquitetura:
/// - API REST protegida por cookie de sessão (/api/*)
/// - Persistência no Postgres via sqlx
/// - WhatsApp delegado ao gateway Evolution API (crate local `evolution`)
/// - Lembretes recorrentes: POST /api/recurrence/check re-invocado por
///   cron, com loop interno opcional de verificação

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use evolution_crm_backend::config::Settings;
use evolution_crm_backend::utils::logging::*;
use evolution_crm_backend::utils::AppError;
use evolution_crm_backend::{db, middleware as app_middleware, services, AppState};

mod handlers;

use handlers::{
    connect_instance, create_instance, create_lead, create_product, create_product_reminder,
    create_reminder, create_stage, delete_instance, delete_lead, delete_product,
    delete_product_reminder, delete_reminder, delete_stage, get_lead, get_product, get_reminder,
    health_check, instance_state, list_instances, list_leads, list_product_reminders,
    list_products, list_reminder_logs, list_reminders, list_stages, login, logout,
    logout_instance, me, move_lead, patch_reminder, ready_check, recurrence_check,
    reorder_stages, send_message, status_check, update_lead, update_product,
    update_product_reminder, update_stage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Carregar variáveis de ambiente do arquivo .env (se existir)
    if dotenvy::dotenv().is_err() {
        // Em produção não existe .env - variáveis vêm do ambiente
        tracing::debug!("Arquivo .env não encontrado - usando variáveis de ambiente do sistema");
    }

    // Inicializar tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Carregar configurações
    let settings = Settings::new()
        .map_err(|e| AppError::ConfigError(format!("Failed to load settings: {}", e)))?;

    log_config_loaded(&std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()));

    // Banco: pool + schema
    let pool = db::connect(&settings.database).await?;
    db::run_migrations(&pool).await?;

    // Serviços
    let sessions = services::SessionService::new(pool.clone(), settings.auth.clone());
    sessions.ensure_admin().await?;

    let whatsapp = services::WhatsAppService::new(&settings.evolution)?;
    let reminders = services::ReminderService::new(pool.clone());
    let reminder_manager = services::ReminderManager::new(
        reminders.clone(),
        whatsapp.clone(),
        settings.scheduler.clone(),
    );

    // Loop interno de verificação (opcional - o cron externo pode chamar
    // /api/recurrence/check em vez disso)
    if settings.scheduler.enabled {
        reminder_manager.start().await;
    } else {
        log_info("ℹ️ Loop interno de lembretes desligado - use POST /api/recurrence/check via cron");
    }

    // Estado da aplicação
    let app_state = Arc::new(AppState {
        settings: settings.clone(),
        db: pool,
        sessions,
        whatsapp,
        reminders,
        reminder_manager,
    });

    // Rotas públicas: health checks + login
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/status", get(status_check))
        .route("/api/auth/login", post(login));

    // Rotas protegidas por cookie de sessão
    let protected_routes = Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        // Kanban
        .route("/api/stages", get(list_stages).post(create_stage))
        .route("/api/stages/reorder", put(reorder_stages))
        .route("/api/stages/:id", put(update_stage).delete(delete_stage))
        .route("/api/leads", get(list_leads).post(create_lead))
        .route(
            "/api/leads/:id",
            get(get_lead).put(update_lead).delete(delete_lead),
        )
        .route("/api/leads/:id/stage", patch(move_lead))
        // Catálogo
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route(
            "/api/products/:id/reminders",
            get(list_product_reminders).post(create_product_reminder),
        )
        .route(
            "/api/reminder-templates/:id",
            put(update_product_reminder).delete(delete_product_reminder),
        )
        // Instâncias WhatsApp (proxy Evolution API)
        .route("/api/instances", get(list_instances).post(create_instance))
        .route("/api/instances/:name/connect", get(connect_instance))
        .route("/api/instances/:name/state", get(instance_state))
        .route("/api/instances/:name/logout", post(logout_instance))
        .route("/api/instances/:name", delete(delete_instance))
        // Mensagens diretas
        .route("/api/messages/send", post(send_message))
        // Lembretes
        .route("/api/reminders", get(list_reminders).post(create_reminder))
        .route("/api/reminders/logs", get(list_reminder_logs))
        .route(
            "/api/reminders/:id",
            get(get_reminder).patch(patch_reminder).delete(delete_reminder),
        )
        .route("/api/recurrence/check", post(recurrence_check))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            app_middleware::require_session,
        ));

    let app = public_routes
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Iniciar servidor (PORT do ambiente tem precedência, padrão Cloud Run)
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(settings.server.port);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    log_server_startup(port);
    log_server_ready(port);

    // Graceful shutdown com signal handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info("🛑 Server shut down gracefully");
    Ok(())
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
