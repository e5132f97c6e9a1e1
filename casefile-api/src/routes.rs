//! HTTP route handlers for agents and cases.

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use casefile::core::query::{AgentQuery, CaseQuery};
use casefile::core::types::{Agent, Case};
use casefile::core::validator::parse_payload;

use crate::error::ApiResult;
use crate::extract::ListQuery;
use crate::state::AppState;

/// Build the registry router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/agentes", get(list_agentes).post(create_agente))
        .route(
            "/agentes/{id}",
            get(get_agente)
                .put(replace_agente)
                .patch(patch_agente)
                .delete(delete_agente),
        )
        .route("/casos", get(list_casos).post(create_caso))
        .route(
            "/casos/{id}",
            get(get_caso)
                .put(replace_caso)
                .patch(patch_caso)
                .delete(delete_caso),
        )
}

async fn health() -> &'static str {
    "ok"
}

/// GET /agentes - filtered and sorted agents.
async fn list_agentes(
    State(state): State<AppState>,
    ListQuery(query): ListQuery<AgentQuery>,
) -> ApiResult<Json<Vec<Agent>>> {
    let registry = state.registry.lock().await;
    Ok(Json(registry.list_agentes(&query)?))
}

async fn get_agente(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Agent>> {
    let registry = state.registry.lock().await;
    Ok(Json(registry.get_agente(&id)?))
}

async fn create_agente(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Agent>)> {
    let payload = parse_payload(&body)?;
    let mut registry = state.registry.lock().await;
    Ok((StatusCode::CREATED, Json(registry.create_agente(&payload)?)))
}

async fn replace_agente(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Agent>> {
    let payload = parse_payload(&body)?;
    let mut registry = state.registry.lock().await;
    Ok(Json(registry.replace_agente(&id, &payload)?))
}

async fn patch_agente(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Agent>> {
    let payload = parse_payload(&body)?;
    let mut registry = state.registry.lock().await;
    Ok(Json(registry.patch_agente(&id, &payload)?))
}

async fn delete_agente(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut registry = state.registry.lock().await;
    registry.delete_agente(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /casos - filtered and sorted cases.
async fn list_casos(
    State(state): State<AppState>,
    ListQuery(query): ListQuery<CaseQuery>,
) -> ApiResult<Json<Vec<Case>>> {
    let registry = state.registry.lock().await;
    Ok(Json(registry.list_casos(&query)?))
}

async fn get_caso(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Case>> {
    let registry = state.registry.lock().await;
    Ok(Json(registry.get_caso(&id)?))
}

async fn create_caso(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Case>)> {
    let payload = parse_payload(&body)?;
    let mut registry = state.registry.lock().await;
    Ok((StatusCode::CREATED, Json(registry.create_caso(&payload)?)))
}

async fn replace_caso(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Case>> {
    let payload = parse_payload(&body)?;
    let mut registry = state.registry.lock().await;
    Ok(Json(registry.replace_caso(&id, &payload)?))
}

async fn patch_caso(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Case>> {
    let payload = parse_payload(&body)?;
    let mut registry = state.registry.lock().await;
    Ok(Json(registry.patch_caso(&id, &payload)?))
}

async fn delete_caso(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut registry = state.registry.lock().await;
    registry.delete_caso(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
