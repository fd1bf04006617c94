use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use itassets::freshdesk::FreshdeskClient;
use itassets::task::SyncScheduler;
use itassets::{db, routes, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "-help" || arg == "--help") {
        println!("Usage: itassets [OPTIONS]");
        println!("Options:");
        println!("  -config <path>  Path to configuration file (default: ./etc/itassets.toml)");
        println!("  -help, --help   Print this help message");
        return Ok(());
    }

    let config_path = args
        .iter()
        .skip_while(|arg| arg.as_str() != "-config")
        .nth(1)
        .map(|s| s.to_string())
        .unwrap_or_else(|| "./etc/itassets.toml".to_string());

    // Load configuration first (before logging init)
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Could not load config file: {}, using defaults", e);
        Config::default()
    });

    // Initialize logging
    // Priority: RUST_LOG env var > config file > default "info"
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting IT Assets server...");
    info!("Loading configuration from: {}", config_path);

    let db_conn = db::init_database(&config.database).await.map_err(|e| {
        tracing::error!("Database initialization failed: {}", e);
        anyhow::anyhow!("Database initialization failed: {}", e)
    })?;

    // Freshdesk sync is optional
    let sync = if config.freshdesk.enabled() {
        let client = FreshdeskClient::new(&config.freshdesk)
            .map_err(|e| anyhow::anyhow!("Freshdesk client initialization failed: {}", e))?;
        let scheduler = Arc::new(SyncScheduler::new(db_conn.clone(), Arc::new(client)));
        if config.freshdesk.sync_interval_secs > 0 {
            scheduler
                .clone()
                .spawn(Duration::from_secs(config.freshdesk.sync_interval_secs));
            info!(
                "Freshdesk sync scheduled every {}s",
                config.freshdesk.sync_interval_secs
            );
        }
        Some(scheduler)
    } else {
        info!("Freshdesk not configured, helpdesk sync disabled");
        None
    };

    // Create application state
    let state = AppState::new(db_conn, config.clone(), sync);

    // Create router
    let app = routes::create_router(state);

    // Parse address
    let addr: SocketAddr = config.addr.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid address '{}', using default 0.0.0.0:8080", config.addr);
        SocketAddr::from(([0, 0, 0, 0], 8080))
    });

    info!("Server listening on {}", addr);

    // Start server
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
