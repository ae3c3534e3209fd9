use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{Config, PairBook, QuoteSource};
use jobs::JobContext;
use provider::TwelveDataClient;
use store::Store;

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(port = cfg.port, "pipbot starting");

    // ── Database ──────────────────────────────────────────────────────────────
    let db = SqlitePool::connect(&cfg.database_url)
        .await
        .unwrap_or_else(|e| panic!("Failed to connect to database: {e}"));
    sqlx::migrate!("../../migrations")
        .run(&db)
        .await
        .unwrap_or_else(|e| panic!("Database migration failed: {e}"));
    info!("Database ready");

    // ── Shared context ────────────────────────────────────────────────────────
    let pairs = Arc::new(PairBook::load(&cfg.pairs_config_path));
    let source: Arc<dyn QuoteSource> = Arc::new(TwelveDataClient::new(&cfg.provider_base_url));
    let ctx = JobContext {
        store: Store::new(db),
        source,
        pairs,
    };

    // ── In-process schedules (optional — cron can drive the HTTP surface
    //    instead when the intervals are left at 0) ──────────────────────────────
    if cfg.signals_interval_secs > 0 {
        info!(interval_secs = cfg.signals_interval_secs, "Starting signals schedule");
        tokio::spawn(jobs::scheduler::signals_loop(
            ctx.clone(),
            cfg.signals_interval_secs,
        ));
    }
    if cfg.indicators_interval_secs > 0 {
        info!(
            interval_secs = cfg.indicators_interval_secs,
            "Starting indicators schedule"
        );
        tokio::spawn(jobs::scheduler::indicators_loop(
            ctx.clone(),
            cfg.indicators_interval_secs,
        ));
    }

    // ── Trigger API ───────────────────────────────────────────────────────────
    let state = api::AppState {
        ctx,
        edge_secret: cfg.edge_secret_key.clone(),
    };
    tokio::spawn(api::serve(state, cfg.port));

    // Keep main alive
    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c().await.unwrap();
    info!("Shutdown signal received. Exiting.");
}
