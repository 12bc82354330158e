use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ventanilla_core::audit::{create_audit_system, AuditEvent, AuditStore, SqliteAuditStore};
use ventanilla_core::{
    load_config, validate_config, CodeGenerator, EventHub, Sector, SectorStore,
    SqliteCodeGenerator, SqliteSectorStore, SqliteTurnStore, TurnService, TurnStore,
};

use ventanilla_server::api::create_router;
use ventanilla_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
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
    let config_path = std::env::var("VENTANILLA_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    // Compute config hash for audit
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    // Create SQLite audit store
    let audit_store: Arc<dyn AuditStore> = Arc::new(
        SqliteAuditStore::new(&config.database.path).context("Failed to create audit store")?,
    );
    info!("Audit store initialized");

    // Create SQLite turn store
    let turn_store: Arc<dyn TurnStore> = Arc::new(
        SqliteTurnStore::new(&config.database.path).context("Failed to create turn store")?,
    );
    info!("Turn store initialized");

    // Create SQLite sector store
    let sector_store: Arc<dyn SectorStore> = Arc::new(
        SqliteSectorStore::new(&config.database.path).context("Failed to create sector store")?,
    );
    info!("Sector store initialized");

    // Create SQLite ticket code generator
    let code_generator: Arc<dyn CodeGenerator> = Arc::new(
        SqliteCodeGenerator::new(&config.database.path)
            .context("Failed to create code generator")?,
    );
    info!("Code generator initialized");

    // Seed configured sectors
    for seed in &config.sectors {
        let sector = Sector {
            id: seed.id.clone(),
            code: seed.code.clone(),
            name: seed.name.clone(),
            active: seed.active,
            max_capacity: seed.max_capacity,
        };
        sector_store
            .upsert(&sector)
            .with_context(|| format!("Failed to seed sector {}", seed.id))?;
    }
    info!("Seeded {} sectors", config.sectors.len());

    // Create audit system
    let (audit_handle, audit_writer) =
        create_audit_system(Arc::clone(&audit_store), config.queue.audit_buffer);

    // Spawn audit writer task
    let writer_handle = tokio::spawn(audit_writer.run());

    // Emit ServiceStarted event
    audit_handle
        .emit(AuditEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: config_hash_short.to_string(),
        })
        .await;
    info!("Emitted ServiceStarted audit event");

    // Create the notification hub and the turn service
    let hub = Arc::new(EventHub::new(config.queue.event_buffer));
    let service = TurnService::new(
        turn_store,
        sector_store,
        code_generator,
        Arc::clone(&hub),
        config.queue.claim_retries,
    )
    .with_audit(audit_handle.clone())
    .with_utc_offset(config.queue.utc_offset_minutes);

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), service, audit_store));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Emit ServiceStopped event
    info!("Server shutting down...");
    audit_handle
        .emit(AuditEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        })
        .await;

    // Drop all holders of AuditHandle so the writer's channel closes.
    // The service's clone lives inside AppState, which the server has released.
    // Order matters: the final event is emitted BEFORE dropping handles.
    drop(audit_handle);

    // Wait for writer to finish processing remaining events
    let _ = writer_handle.await;
    info!("Audit writer stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
