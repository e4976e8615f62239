use crate::cli::ServeArgs;
use crate::routes::router;
use crate::state::AppState;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use doc_assembly::config::AppConfig;
use doc_assembly::error::AppError;
use doc_assembly::telemetry;
use doc_assembly::DocumentAssembler;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
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

    let assembler = Arc::new(DocumentAssembler::from_config(&config)?);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        assembler,
    };

    let app = router()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        environment = config.environment.as_str(),
        %addr,
        max_pages = config.render.max_pages,
        "document assembly service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
