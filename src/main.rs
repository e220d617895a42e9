use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use kitchensync::{config, db, handlers, notifier::ChangeNotifier, runtime_params::RuntimeParams, sweeper, AppState};
use migrations::{Migrator, MigratorTrait};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let app_config = config::load_config()?;
    config::init_tracing(&app_config.log_level, app_config.log_json);

    info!("KitchenSync starting in {} environment", app_config.environment);

    let db_conn = db::connect(&app_config).await.map_err(|e| {
        error!("failed to connect to database: {e}");
        e
    })?;

    info!("running pending migrations");
    Migrator::up(&db_conn, None).await?;

    let runtime_params = Arc::new(RuntimeParams::new(
        app_config.reservation_ttl_seconds,
        app_config.reservation_warning_threshold_seconds,
    ));
    let notifier = Arc::new(ChangeNotifier::new());
    let config = Arc::new(app_config);

    let state = AppState {
        db: db_conn.clone(),
        config: config.clone(),
        runtime_params: runtime_params.clone(),
        notifier: notifier.clone(),
    };

    // Exactly one sweeper instance per process; never in test builds.
    if config.enable_inprocess_expiration_job && !config.is_test() {
        let sweeper_conn = db_conn.clone();
        let sweeper_notifier = notifier.clone();
        let interval = Duration::from_secs(config.expiration_interval_seconds);
        tokio::spawn(async move {
            sweeper::run(sweeper_conn, sweeper_notifier, interval).await;
        });
        info!(
            interval_secs = config.expiration_interval_seconds,
            "expiration sweeper started"
        );
    } else {
        info!("expiration sweeper disabled; rely on /internal/expire_once");
    }

    let app = handlers::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
