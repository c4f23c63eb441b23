use capnote::{
    config::{database, settings, users},
    dashboard::Dashboard,
    errors::Result,
    notify::{Notifier, TracingNotifier},
    session::SessionHandle,
};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();

    // 3. Settings file (optional)
    let app_settings = settings::load_settings_from_env()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;

    // 4. Remote store
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;
    let db = Arc::new(db);

    // 5. Session and dashboard
    let session = users::session_from_env()
        .inspect_err(|e| error!("No user configured (set CAPNOTE_USER_ID): {}", e))?;
    let sessions = SessionHandle::new(Some(session));
    let mut changes = sessions.subscribe();

    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier::new(true));
    let mut dashboard = Dashboard::new(db, &app_settings, notifier);
    let permission = dashboard.scheduler().request_permission();
    info!("Notifications: {:?}", permission);

    dashboard.set_session(sessions.current()).await;
    if let Some(message) = dashboard.error() {
        error!("{}", message);
    }
    dashboard.log_summary();

    // 6. Keep reminders alive until Ctrl-C
    info!(
        "{} reminders armed; press Ctrl-C to exit.",
        dashboard.scheduler().pending_count()
    );
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
            followed = dashboard.follow_session(&mut changes) => {
                if !followed {
                    break;
                }
                dashboard.log_summary();
            }
        }
    }

    sessions.sign_out();
    info!("Shutting down.");
    Ok(())
}
