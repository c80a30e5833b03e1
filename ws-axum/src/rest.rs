use std::collections::HashMap;

use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, Query, State},
    http::HeaderMap,
    routing, Json, Router,
};
use serde_json::json;
use tracing::instrument;
use ws_core::errors::WsError;
use ws_core::{CreatedWorkspace, NewWorkspace, Workspace, WorkspacePatch};

use crate::params::{find_query, tenant_from_headers};
use crate::{WsAxumError, WsAxumState};

fn map_json_rejection(rejection: JsonRejection) -> WsAxumError {
    WsError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.to_string()]}))
        .into()
}

#[instrument(skip_all)]
async fn find(
    State(state): State<WsAxumState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Workspace>>, WsAxumError> {
    let tenant = tenant_from_headers(&headers);
    let res = state.app.find(tenant, find_query(&query)).await?;
    Ok(Json(res))
}

#[instrument(skip_all)]
async fn create(
    State(state): State<WsAxumState>,
    headers: HeaderMap,
    data: Result<Json<NewWorkspace>, JsonRejection>,
) -> Result<Json<CreatedWorkspace>, WsAxumError> {
    let tenant = tenant_from_headers(&headers);
    let Json(data) = data.map_err(map_json_rejection)?;

    let ws = state.app.create(tenant, data).await?;
    Ok(Json(CreatedWorkspace { id: ws.id }))
}

#[instrument(skip_all)]
async fn get(
    State(state): State<WsAxumState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Workspace>, WsAxumError> {
    let tenant = tenant_from_headers(&headers);
    let res = state.app.get(tenant, &id).await?;
    Ok(Json(res))
}

// PUT and PATCH share merge semantics: absent fields are left untouched.
#[instrument(skip_all)]
async fn update(
    State(state): State<WsAxumState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    data: Result<Json<WorkspacePatch>, JsonRejection>,
) -> Result<Json<Workspace>, WsAxumError> {
    let tenant = tenant_from_headers(&headers);
    let Json(data) = data.map_err(map_json_rejection)?;

    let res = state.app.patch(tenant, &id, data).await?;
    Ok(Json(res))
}

#[instrument(skip_all)]
async fn remove(
    State(state): State<WsAxumState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Workspace>, WsAxumError> {
    let tenant = tenant_from_headers(&headers);
    let res = state.app.remove(tenant, &id).await?;
    Ok(Json(res))
}

/// `GET|POST /` and `GET|PUT|PATCH|DELETE /{id}` over the workspace app.
pub fn workspace_router(state: WsAxumState) -> Router<()> {
    Router::new()
        .route("/", routing::get(find).post(create))
        .route(
            "/{id}",
            routing::get(get).put(update).patch(update).delete(remove),
        )
        .with_state(state)
}
