use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use vetwatch::error::AppError;
use vetwatch::oversight::scorecard::{
    scorecard_router, AlertPublisher, OversightInsights, OversightSummary, ScorecardRepository,
    ScorecardService,
};

#[derive(Debug, Serialize)]
pub(crate) struct OverviewReportResponse {
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) summary: OversightSummary,
    pub(crate) insights: OversightInsights,
}

pub(crate) fn with_scorecard_routes<R, A>(service: Arc<ScorecardService<R, A>>) -> axum::Router
where
    R: ScorecardRepository + 'static,
    A: AlertPublisher + 'static,
{
    scorecard_router(service.clone())
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/reports/overview",
            axum::routing::get(overview_endpoint::<R, A>),
        )
        .layer(Extension(service))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn overview_endpoint<R, A>(
    Extension(service): Extension<Arc<ScorecardService<R, A>>>,
) -> Result<Json<OverviewReportResponse>, AppError>
where
    R: ScorecardRepository + 'static,
    A: AlertPublisher + 'static,
{
    let summary = service.overview()?;
    let insights = summary.insights();

    Ok(Json(OverviewReportResponse {
        generated_at: Utc::now(),
        summary,
        insights,
    }))
}
