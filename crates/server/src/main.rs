use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marquee_core::{
    create_audit_system, load_config, AuditEvent, AuditStore, ConfigStore, IngestGateway,
    SignFleet, SqliteAuditStore,
};

use marquee_server::api::{create_router, RenderBroadcaster};
use marquee_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for audit event channel
const AUDIT_BUFFER_SIZE: usize = 1000;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("MARQUEE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate and compile profiles
    let config_store = ConfigStore::load(config).context("Configuration validation failed")?;
    let snapshot = config_store.snapshot();

    info!("Configuration loaded successfully");
    info!(
        "Upload channel: {}",
        if snapshot.config().ingest.active_password().is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );
    info!("Database path: {:?}", snapshot.config().database.path);

    // Create SQLite audit store
    let audit_store: Arc<dyn AuditStore> = Arc::new(
        SqliteAuditStore::new(&snapshot.config().database.path)
            .context("Failed to create audit store")?,
    );
    info!("Audit store initialized");

    // Create audit system
    let (audit_handle, audit_writer) =
        create_audit_system(Arc::clone(&audit_store), AUDIT_BUFFER_SIZE);

    // Spawn audit writer task
    let writer_handle = tokio::spawn(audit_writer.run());

    // Emit ServiceStarted event
    audit_handle
        .emit(AuditEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: snapshot.config_hash().to_string(),
        })
        .await;
    info!("Emitted ServiceStarted audit event");

    // Renderers subscribe to this over WebSocket
    let renderers = RenderBroadcaster::default();

    // One actor per sign
    let fleet = Arc::new(SignFleet::start(
        config_store.clone(),
        Arc::new(renderers.clone()),
        Some(audit_handle.clone()),
    ));

    let gateway = IngestGateway::new(
        config_store.clone(),
        Arc::clone(&fleet) as Arc<dyn marquee_core::ShowRouter>,
        Some(audit_handle.clone()),
    );

    // Create app state
    let state = Arc::new(AppState::new(
        config_path,
        config_store,
        Arc::clone(&fleet),
        gateway,
        audit_handle.clone(),
        audit_store,
        renderers,
    ));

    #[cfg(unix)]
    let hangup_task = tokio::spawn(reload_on_hangup(Arc::clone(&state)));

    // Create router
    let app = create_router(Arc::clone(&state));

    // Start server
    let addr = SocketAddr::new(snapshot.config().server.host, snapshot.config().server.port);
    drop(snapshot);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    #[cfg(unix)]
    {
        hangup_task.abort();
        let _ = hangup_task.await;
    }

    info!("Stopping sign fleet...");
    fleet.stop().await;

    // Emit ServiceStopped event
    info!("Server shutting down...");
    audit_handle
        .emit(AuditEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        })
        .await;

    // Drop all holders of AuditHandle so the writer's channel closes.
    // The gateway inside AppState holds a clone, so the state goes too.
    drop(state);
    drop(fleet);
    drop(audit_handle);

    // Wait for writer to finish processing remaining events
    let _ = writer_handle.await;
    info!("Audit writer stopped");

    Ok(())
}

/// Reload the configuration file on every SIGHUP.
#[cfg(unix)]
async fn reload_on_hangup(state: Arc<AppState>) {
    let mut hangup = match signal::unix::signal(signal::unix::SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            error!("Failed to install SIGHUP handler: {}", e);
            return;
        }
    };

    while hangup.recv().await.is_some() {
        info!(path = ?state.config_path(), "SIGHUP received, reloading configuration");
        // Outcome is logged and audited by reload_config.
        let _ = state.reload_config("sighup").await;
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
