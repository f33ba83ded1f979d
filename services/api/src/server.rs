use crate::cli::ServeArgs;
use crate::infra::{
    default_scoring_config, AppState, InMemoryAlertPublisher, InMemoryScorecardRepository,
    NATIONAL_ID, NATIONAL_NAME,
};
use crate::routes::with_scorecard_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use vetwatch::config::AppConfig;
use vetwatch::error::AppError;
use vetwatch::oversight::roster::RosterImporter;
use vetwatch::oversight::scorecard::ScorecardService;
use vetwatch::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    telemetry::init(&config.telemetry)?;

    let service = Arc::new(ScorecardService::new(
        Arc::new(InMemoryScorecardRepository::default()),
        Arc::new(InMemoryAlertPublisher::default()),
        default_scoring_config(&config.scoring),
    ));

    // With --roster the instance comes up already populated and scored
    // instead of waiting for entities over the API.
    if let Some(path) = args.roster.take() {
        let import = RosterImporter::from_path(path, NATIONAL_ID, NATIONAL_NAME)?;
        for entity in &import.entities {
            service.upsert_entity(entity.clone())?;
        }
        let now = Utc::now();
        for facility in import.facilities() {
            service.recompute_from(&facility.id, now)?;
        }
        info!(
            facilities = import.facility_count(),
            visns = import.visn_count(),
            skipped = import.skipped.len(),
            "roster preloaded and scored"
        );
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness.clone(),
        metrics: Arc::new(prometheus_handle),
    };
    let app = with_scorecard_routes(service)
        .layer(Extension(state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness.store(true, Ordering::Release);
    info!(?config.environment, %addr, "scorecard portal listening");

    axum::serve(listener, app).await?;
    Ok(())
}
