//! Axum surface for the scorecard engine.
//!
//! Handlers stay thin: extract, call the service, translate the error
//! taxonomy onto status codes. Writes answer 202 because they only flip
//! staleness; the recompute endpoint is where scores actually change.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::domain::{Entity, EntityId, IntegrityEventDraft, Representative, RepresentativeId};
use super::repository::{AlertPublisher, ScorecardRepository};
use super::service::{EngineError, ScorecardService};

pub fn scorecard_router<R, A>(service: Arc<ScorecardService<R, A>>) -> Router
where
    R: ScorecardRepository + 'static,
    A: AlertPublisher + 'static,
{
    Router::new()
        .route("/api/v1/entities", post(upsert_entity_handler::<R, A>))
        .route(
            "/api/v1/representatives",
            post(upsert_representative_handler::<R, A>),
        )
        .route(
            "/api/v1/integrity-events",
            post(record_integrity_event_handler::<R, A>),
        )
        .route(
            "/api/v1/entities/:entity_id/recompute",
            post(recompute_handler::<R, A>),
        )
        .route(
            "/api/v1/scorecards/:entity_id",
            get(scorecard_handler::<R, A>),
        )
        .route(
            "/api/v1/representatives/:representative_id/score",
            get(representative_score_handler::<R, A>),
        )
        .with_state(service)
}

pub(crate) async fn upsert_entity_handler<R, A>(
    State(service): State<Arc<ScorecardService<R, A>>>,
    Json(entity): Json<Entity>,
) -> Response
where
    R: ScorecardRepository + 'static,
    A: AlertPublisher + 'static,
{
    let entity_id = entity.id.clone();
    match service.upsert_entity(entity) {
        Ok(()) => {
            let body = json!({ "entity_id": entity_id, "freshness": "stale" });
            (StatusCode::ACCEPTED, Json(body)).into_response()
        }
        Err(EngineError::Hierarchy(error)) => {
            let body = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn upsert_representative_handler<R, A>(
    State(service): State<Arc<ScorecardService<R, A>>>,
    Json(representative): Json<Representative>,
) -> Response
where
    R: ScorecardRepository + 'static,
    A: AlertPublisher + 'static,
{
    let representative_id = representative.id.clone();
    match service.upsert_representative(representative) {
        Ok(()) => {
            let body = json!({ "representative_id": representative_id });
            (StatusCode::ACCEPTED, Json(body)).into_response()
        }
        Err(EngineError::Hierarchy(error)) => {
            let body = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn record_integrity_event_handler<R, A>(
    State(service): State<Arc<ScorecardService<R, A>>>,
    Json(draft): Json<IntegrityEventDraft>,
) -> Response
where
    R: ScorecardRepository + 'static,
    A: AlertPublisher + 'static,
{
    match service.record_integrity_event(draft) {
        Ok(event) => (StatusCode::ACCEPTED, Json(event)).into_response(),
        Err(EngineError::EntityNotFound(entity_id)) => {
            let body = json!({ "error": format!("entity {entity_id} is not registered") });
            (StatusCode::NOT_FOUND, Json(body)).into_response()
        }
        Err(
            error @ (EngineError::Ledger(_)
            | EngineError::IntegrityTargetNotFacility { .. }
            | EngineError::UnknownIntegrityCategory(_)),
        ) => {
            let body = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn recompute_handler<R, A>(
    State(service): State<Arc<ScorecardService<R, A>>>,
    Path(entity_id): Path<String>,
) -> Response
where
    R: ScorecardRepository + 'static,
    A: AlertPublisher + 'static,
{
    let entity_id = EntityId(entity_id);
    match service.recompute_from(&entity_id, Utc::now()) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(EngineError::EntityNotFound(entity_id)) => {
            let body = json!({ "error": format!("entity {entity_id} is not registered") });
            (StatusCode::NOT_FOUND, Json(body)).into_response()
        }
        Err(error @ EngineError::RecomputeContention { .. }) => {
            let body = json!({ "error": error.to_string() });
            (StatusCode::CONFLICT, Json(body)).into_response()
        }
        Err(EngineError::Score(error)) => {
            let body = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn scorecard_handler<R, A>(
    State(service): State<Arc<ScorecardService<R, A>>>,
    Path(entity_id): Path<String>,
) -> Response
where
    R: ScorecardRepository + 'static,
    A: AlertPublisher + 'static,
{
    let entity_id = EntityId(entity_id);
    match service.get_scorecard(&entity_id) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(EngineError::EntityNotFound(entity_id)) => {
            let body = json!({ "error": format!("entity {entity_id} is not registered") });
            (StatusCode::NOT_FOUND, Json(body)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn representative_score_handler<R, A>(
    State(service): State<Arc<ScorecardService<R, A>>>,
    Path(representative_id): Path<String>,
) -> Response
where
    R: ScorecardRepository + 'static,
    A: AlertPublisher + 'static,
{
    let representative_id = RepresentativeId(representative_id);
    match service.representative_score(&representative_id, Utc::now()) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(EngineError::RepresentativeNotFound(representative_id)) => {
            let body =
                json!({ "error": format!("representative {representative_id} is not registered") });
            (StatusCode::NOT_FOUND, Json(body)).into_response()
        }
        Err(EngineError::Score(error)) => {
            let body = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

fn internal_error(error: EngineError) -> Response {
    let body = json!({ "error": error.to_string() });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
