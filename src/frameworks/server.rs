use crate::domain::directory::LocalGuestDirectory;
use crate::domain::ports::{AuditLog, GuestStore, GuestbookStore, PredictionBoard, StorageCache};
use crate::frameworks::config::Settings;
use crate::frameworks::db;
use crate::interface_adapters::handlers::admin::guests_use_case;
use crate::interface_adapters::postgres::{
    PostgresAuditLog, PostgresGuestStore, PostgresGuestbook, PostgresPredictionBoard,
};
use crate::interface_adapters::routes;
use crate::interface_adapters::state::{
    AppState, MemoryAuditLog, MemoryGuestbook, MemoryPredictionBoard, MemoryStorageCache,
};
use crate::interface_adapters::storage::JsonFileStorage;
use crate::use_cases::registry::GuestRegistry;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run() {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::load();

    // Session and mirror blobs go to disk when a directory is configured.
    let cache: Arc<dyn StorageCache> = match &settings.storage_dir {
        Some(dir) => Arc::new(JsonFileStorage::new(dir.clone())),
        None => Arc::new(MemoryStorageCache::new()),
    };

    // With a database the guest documents live in Postgres; without one the
    // bundled directory answers lookups and admin edits stay local.
    let (guest_store, audit, guestbook, predictions): (
        Option<Arc<dyn GuestStore>>,
        Arc<dyn AuditLog>,
        Arc<dyn GuestbookStore>,
        Arc<dyn PredictionBoard>,
    ) = match &settings.database_url {
        Some(database_url) => {
            let db = match db::connect_pool(database_url).await {
                Ok(pool) => pool,
                Err(error) => {
                    tracing::error!(error = %error, "failed to connect to database");
                    return;
                }
            };
            if let Err(error) = db::run_migrations(&db).await {
                tracing::error!(error = %error, "failed to run migrations");
                return;
            }
            (
                Some(Arc::new(PostgresGuestStore::new(db.clone()))),
                Arc::new(PostgresAuditLog { db: db.clone() }),
                Arc::new(PostgresGuestbook { db: db.clone() }),
                Arc::new(PostgresPredictionBoard { db }),
            )
        }
        None => {
            tracing::info!("no database configured, serving from the bundled guest list");
            (
                None,
                Arc::new(MemoryAuditLog::new()),
                Arc::new(MemoryGuestbook::new()),
                Arc::new(MemoryPredictionBoard::new()),
            )
        }
    };

    let state = AppState {
        registry: Arc::new(Mutex::new(GuestRegistry::new())),
        guest_store,
        cache,
        audit,
        guestbook,
        predictions,
        admin_sessions: Arc::new(Mutex::new(HashMap::new())),
        directory: Arc::new(LocalGuestDirectory::bundled()),
        admin_passcode: settings.admin_passcode,
        admin_session_ttl_seconds: settings.admin_session_ttl_seconds,
        public_origin: settings.public_origin,
        event_title: settings.event_title,
    };

    // Seed the registry, then keep it following the store feed.
    let admin = Arc::new(guests_use_case(&state));
    admin.bootstrap(&state.directory).await;
    if state.guest_store.is_some() {
        let sync = admin.clone();
        tokio::spawn(async move { sync.run_sync().await });
    }

    // Wire the HTTP routes for the invite API.
    let app = routes::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!(%addr, "listening");

    // Bind TCP listener with error handling.
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%addr, %error, "failed to bind");
            return; // Abort startup on bind failure.
        }
    };

    // Serve app and report errors rather than panicking.
    if let Err(error) = axum::serve(listener, app).await {
        tracing::error!(%error, "server error");
    }
}
