use crate::cli::ServeArgs;
use crate::infra::{build_service, load_models, AppState};
use crate::routes::with_scoring_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use credit_scoring::config::AppConfig;
use credit_scoring::error::AppError;
use credit_scoring::telemetry;
use std::sync::Arc;
use tracing::{info, warn};

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
    let service = build_service(&config.models);
    let app_state = AppState {
        service: service.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_scoring_routes(service.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(?config.environment, %addr, "credit scoring service listening");

    // Scoring answers 503 until the artifacts below are installed.
    let models = config.models.clone();
    tokio::task::spawn_blocking(move || {
        let report = load_models(&service, &models);
        if report.failed == 0 {
            info!(installed = report.installed, "all models loaded");
        } else {
            warn!(
                installed = report.installed,
                failed = report.failed,
                "some products remain unavailable"
            );
        }
    });

    axum::serve(listener, app).await?;
    Ok(())
}
