use crate::cli::ServeArgs;
use crate::infra::{shutdown_signal, AppState};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use house_finder::app::load_estimator;
use house_finder::config::AppConfig;
use house_finder::db::connect_and_migrate;
use house_finder::error::AppError;
use house_finder::{telemetry, HouseFinder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let pool = connect_and_migrate(&config.database).await?;
    let estimator = load_estimator(&config)?;
    let shutdown = CancellationToken::new();
    let house_finder = HouseFinder::new(pool.clone(), &config, estimator, shutdown.clone());

    let app = with_operational_routes(&house_finder)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, database = %config.database.url, "house finder ready");

    let sessions = Arc::clone(&house_finder.sessions);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            readiness_flag.store(false, Ordering::Release);
            sessions.shutdown();
        })
        .await?;

    pool.close().await;
    info!("house finder stopped");
    Ok(())
}
