use gambet_visions::config::Config;
use gambet_visions::db::{self, SchemaManager, VisionRepository};
use gambet_visions::router::{VisionsState, cors_layer, visions_router};
use gambet_visions::service::{ImageEmbedder, seed};
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        listen = %cfg.listen_addr(),
        loglevel = %cfg.loglevel,
        seed_on_empty = cfg.seed_on_empty
    );

    let http_client = reqwest::Client::builder().build()?;
    let embedder = ImageEmbedder::new(
        http_client,
        cfg.image_fetch_timeout(),
        cfg.image_max_bytes,
    );

    let (state, pool) = if cfg.storage_configured() {
        let pool = db::connect(&cfg.database_url).await?;
        let report = SchemaManager::new(pool.clone()).ensure_schema().await?;
        if !report.image_data_available() {
            warn!(outcome = ?report.image_data, "image_data column unavailable; images will not be stored inline");
        }
        let repository =
            VisionRepository::new(pool.clone()).with_image_data(report.image_data_available());

        if cfg.seed_on_empty {
            match seed::seed_if_empty(&repository).await {
                Ok(n) => info!(inserted = n, "seed finished"),
                Err(e) => warn!(error = %e, "seeding failed"),
            }
        }
        (VisionsState::new(repository, embedder), Some(pool))
    } else {
        warn!("DATABASE_URL is empty; vision routes will report storage not configured");
        (VisionsState::unconfigured(embedder), None)
    };

    let app = visions_router(state).layer(cors_layer(&cfg.cors_origins()));

    let addr = cfg.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        pool.close().await;
        info!("database pool closed");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
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
    info!("shutdown signal received");
}
