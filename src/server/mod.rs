// SPDX-License-Identifier: MIT

//! HTTP trigger surface for the inference engine
//!
//! `GET /infer/states/` and `GET /infer/behaviors/` run a stage over every
//! subject; the `{id}` variants run it for one subject and return the report
//! object unwrapped. Requesting an unknown or ill-formed id is a 404.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::engine::{InferenceEngine, SubjectInference, SubjectSelector};
use crate::error::EngineError;
use crate::store::MemoryStore;

type SharedEngine = Arc<InferenceEngine>;

pub async fn serve(
    port: u16,
    store: MemoryStore,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let engine: SharedEngine = Arc::new(InferenceEngine::new(
        Arc::new(store.clone()),
        Arc::new(store),
    ));

    let app = router(engine);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(engine: SharedEngine) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/infer/states/", get(infer_states_all))
        .route("/infer/states/{id}", get(infer_states_one))
        .route("/infer/behaviors/", get(infer_behaviors_all))
        .route("/infer/behaviors/{id}", get(infer_behaviors_one))
        .with_state(engine)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn infer_states_all(State(engine): State<SharedEngine>) -> Response {
    match engine.run_state_inference(SubjectSelector::All, None).await {
        Ok(report) => all_subjects_body(&report, "states"),
        Err(e) => error_response(e),
    }
}

async fn infer_states_one(State(engine): State<SharedEngine>, Path(id): Path<String>) -> Response {
    let Some(id) = parse_id(&id) else {
        return not_found(&id);
    };
    match engine
        .run_state_inference(SubjectSelector::One(id), None)
        .await
    {
        Ok(report) => single_subject_body(&report, "states", id),
        Err(e) => error_response(e),
    }
}

async fn infer_behaviors_all(State(engine): State<SharedEngine>) -> Response {
    match engine
        .run_behavior_inference(SubjectSelector::All, None)
        .await
    {
        Ok(report) => all_subjects_body(&report, "behaviors"),
        Err(e) => error_response(e),
    }
}

async fn infer_behaviors_one(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return not_found(&id);
    };
    match engine
        .run_behavior_inference(SubjectSelector::One(id), None)
        .await
    {
        Ok(report) => single_subject_body(&report, "behaviors", id),
        Err(e) => error_response(e),
    }
}

// An ill-formed identity is treated the same as an absent one.
fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

fn all_subjects_body(report: &[SubjectInference], key: &str) -> Response {
    let body: Vec<Value> = report.iter().map(|s| s.to_body(key)).collect();
    Json(Value::Array(body)).into_response()
}

fn single_subject_body(report: &[SubjectInference], key: &str, id: Uuid) -> Response {
    match report.first() {
        Some(subject) => Json(subject.to_body(key)).into_response(),
        None => not_found(&id.to_string()),
    }
}

fn not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("Subject '{}' not found", id) })),
    )
        .into_response()
}

fn error_response(err: EngineError) -> Response {
    if err.is_not_found() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response();
    }

    log::error!("Inference failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}
