//! Axum server exposing a node's [`rebac_dispatch::Dispatcher`] to its peers.
//! A peer that routes a fingerprint to this node posts the same request type
//! the local resolvers consume; the handler hands it straight to the
//! dispatcher, so the receiving node applies its own cache and may itself
//! recurse across the ring exactly as it would for a locally-originated call.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use rebac_dispatch::{DispatchError, Dispatcher};
use rebac_engine::types::{
    CheckRequest, CheckResponse, ExpandRequest, ExpandResponse, LookupResourcesRequest,
    LookupResourcesResponse, LookupSubjectsRequest, LookupSubjectsResponse,
    ReachableResourcesRequest, ReachableResourcesResponse,
};
use rebac_engine::Dispatch;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::error::status_and_code;

pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

type HandlerResult<T> = Result<Json<T>, (StatusCode, Json<ErrorBody>)>;

fn error_response(err: rebac_engine::EngineError) -> (StatusCode, Json<ErrorBody>) {
    let err = DispatchError::from(err);
    let (status, code) = status_and_code(&err);
    (status, Json(ErrorBody { code, message: err.to_string() }))
}

async fn health() -> &'static str {
    "ok"
}

async fn check(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CheckRequest>,
) -> HandlerResult<CheckResponse> {
    state.dispatcher.check(request).await.map(Json).map_err(error_response)
}

async fn expand(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExpandRequest>,
) -> HandlerResult<ExpandResponse> {
    state.dispatcher.expand(request).await.map(Json).map_err(error_response)
}

async fn reachable_resources(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReachableResourcesRequest>,
) -> HandlerResult<ReachableResourcesResponse> {
    state
        .dispatcher
        .reachable_resources(request)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn lookup_resources(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LookupResourcesRequest>,
) -> HandlerResult<LookupResourcesResponse> {
    state
        .dispatcher
        .lookup_resources(request)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn lookup_subjects(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LookupSubjectsRequest>,
) -> HandlerResult<LookupSubjectsResponse> {
    state
        .dispatcher
        .lookup_subjects(request)
        .await
        .map(Json)
        .map_err(error_response)
}

#[must_use]
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    let state = Arc::new(AppState { dispatcher });
    Router::new()
        .route("/health", get(health))
        .route("/dispatch/check", post(check))
        .route("/dispatch/expand", post(expand))
        .route("/dispatch/reachable_resources", post(reachable_resources))
        .route("/dispatch/lookup_resources", post(lookup_resources))
        .route("/dispatch/lookup_subjects", post(lookup_subjects))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
