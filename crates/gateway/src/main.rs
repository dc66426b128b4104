//! ScholarMatch API Gateway
//!
//! The front door for matching runs. Handles:
//! - Session lifecycle
//! - Match start / status / results
//! - Professor profile reads from the cache store
//! - Observability (logging, metrics, tracing)
//!
//! The matching pipeline itself runs as a background task per session;
//! this binary only validates requests, spawns runs, and serves the
//! polled progress state.

mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use scholarmatch_common::{
    cache::SqlProfessorCache,
    config::AppConfig,
    db::{DbPool, ProfessorRepository},
    metrics,
    session::{RedisSessionStore, SessionStore},
    storage::FileStorage,
};
use scholarmatch_matcher::{HttpToolGateway, MatchPipeline, ToolSet};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<dyn SessionStore>,
    pub pipeline: Arc<MatchPipeline>,
    pub professors: ProfessorRepository,
    pub db: DbPool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.observability.log_level.clone()));
    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!("Starting ScholarMatch API Gateway v{}", scholarmatch_common::VERSION);

    let config = Arc::new(config);

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        let exporter_addr =
            SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(exporter_addr)
            .install()?;
        info!("Prometheus exporter listening on {}", exporter_addr);
    }

    // Initialize stores
    let db = DbPool::new(&config.database).await?;
    let professors = ProfessorRepository::new(db.clone());

    let sessions: Arc<dyn SessionStore> = Arc::new(
        RedisSessionStore::connect(
            &config.redis.url,
            &config.redis.key_prefix,
            config.redis.session_ttl_secs,
        )
        .await?,
    );

    // Wire the pipeline with its explicit collaborator set
    let tools = Arc::new(ToolSet::new(Arc::new(HttpToolGateway::new(
        config.tools.clone(),
        config.oracle.clone(),
    ))));
    let cache = Arc::new(SqlProfessorCache::new(
        professors.clone(),
        config.cache_ttl(),
    ));
    let pipeline = Arc::new(MatchPipeline::new(
        tools,
        cache,
        Arc::clone(&sessions),
        FileStorage::new(config.storage.upload_dir.clone()),
        config.matching.clone(),
    ));

    let state = AppState {
        config: config.clone(),
        sessions,
        pipeline,
        professors,
        db,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Session endpoints
        .route("/sessions", post(handlers::sessions::create_session))
        .route("/sessions/{id}", get(handlers::sessions::get_session))
        // Match endpoints
        .route("/match", post(handlers::matches::start_match))
        .route("/match/{match_id}/status", get(handlers::matches::get_status))
        .route("/match/{match_id}/results", get(handlers::matches::get_results))
        // Professor endpoints
        .route("/professor/{id}", get(handlers::professors::get_professor));

    // Compose the app
    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
