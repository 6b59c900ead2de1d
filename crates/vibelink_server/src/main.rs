use axum::{
    Router,
    extract::Extension,
    http::{HeaderValue, Method, header},
    routing::get,
};
use rusqlite::Connection;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vibelink_core::{
    channel::{ChannelResolver, ReqwestFetcher},
    store::{BlockStore, SqliteDataStore},
};
use vibelink_server::{
    auth::OwnerExtractor,
    config::Config,
    db::{ProfileRepo, init_database},
    handlers::{
        api::ApiState, api_routes, block_routes, blocks::BlocksState, profile::ProfileState,
        public_routes,
    },
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "vibelink_server=debug,vibelink_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting VibeLink Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Database path: {:?}", config.database_path);
    info!("CORS origins: {:?}", config.cors_origins);

    // Initialize database
    let conn = match Connection::open(&config.database_path) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_database(&conn) {
        error!("Failed to initialize database: {}", e);
        std::process::exit(1);
    }

    let data_store = match SqliteDataStore::open(&config.database_path) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open block store: {}", e);
            std::process::exit(1);
        }
    };

    let fetcher = match ReqwestFetcher::new(&config.resolver) {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    // Create shared state
    let repo = Arc::new(ProfileRepo::new(conn));
    let store = BlockStore::new(Arc::new(data_store));
    let resolver = Arc::new(ChannelResolver::new(Arc::new(fetcher), &config.resolver));

    let owner_extractor = match OwnerExtractor::new(&config.owner_header, repo.clone()) {
        Ok(e) => e,
        Err(e) => {
            error!("Invalid OWNER_HEADER {:?}: {}", config.owner_header, e);
            std::process::exit(1);
        }
    };

    // Create handler states
    let api_state = ApiState {
        repo: repo.clone(),
        resolver: resolver.clone(),
    };

    let blocks_state = BlocksState::new(store.clone());

    let profile_state = ProfileState {
        repo: repo.clone(),
        store,
        resolver: resolver.clone(),
    };

    // Build CORS layer
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(AllowOrigin::list(origins));

    // Build the router
    let app = Router::new()
        // Health check
        .route("/", get(|| async { "VibeLink Server" }))
        .route("/health", get(|| async { "OK" }))
        // Owner API
        .nest("/api/blocks", block_routes(blocks_state))
        .nest("/api", api_routes(api_state))
        // Public profile pages
        .nest("/u", public_routes(profile_state))
        // Add layers
        .layer(Extension(owner_extractor))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Create listener
    let addr = config.server_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Server listening on http://{}", addr);

    // Start cache cleanup task
    let cleanup_resolver = resolver.clone();
    let cleanup_every = config.resolver.cache_ttl().max(std::time::Duration::from_secs(60));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_every);
        loop {
            interval.tick().await;
            let purged = cleanup_resolver.cache().purge_expired();
            if purged > 0 {
                info!("Purged {} expired channel feed entries", purged);
            }
        }
    });

    // Run server with graceful shutdown
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }

    info!("Server shut down gracefully");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
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

    info!("Shutdown signal received");
}
