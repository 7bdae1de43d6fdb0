// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Directory backend routes for Google sources.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{ContactListParams, ContactPage, RequestContext, SourceResult};
use crate::services::GoogleSource;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/0.1/backends/google/sources/{source_name}/contacts",
            get(list_contacts),
        )
        .route(
            "/0.1/backends/google/sources/{source_name}/lookup",
            get(lookup),
        )
        .route(
            "/0.1/backends/google/sources/{source_name}/reverse",
            get(reverse),
        )
        .route(
            "/0.1/backends/google/sources/{source_name}/list",
            post(list_by_ids),
        )
}

#[derive(Debug, Deserialize)]
pub struct TermParams {
    term: String,
}

#[derive(Debug, Deserialize)]
pub struct ListRequest {
    #[serde(default)]
    ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub results: Vec<SourceResult>,
}

#[derive(Debug, Serialize)]
pub struct ReverseResponse {
    pub result: Option<SourceResult>,
}

fn source<'a>(state: &'a AppState, source_name: &str) -> Result<&'a GoogleSource> {
    state
        .sources
        .get(source_name)
        .ok_or_else(|| AppError::NotFound(format!("Unknown source {}", source_name)))
}

/// Paginated listing of the user's contacts.
async fn list_contacts(
    State(state): State<Arc<AppState>>,
    Path(source_name): Path<String>,
    params: std::result::Result<Query<ContactListParams>, QueryRejection>,
    ctx: RequestContext,
) -> Result<Json<ContactPage>> {
    let Query(params) = params?;
    let page = source(&state, &source_name)?
        .list_contacts(&ctx, &params)
        .await?;

    Ok(Json(page))
}

/// Free-text search.
async fn lookup(
    State(state): State<Arc<AppState>>,
    Path(source_name): Path<String>,
    params: std::result::Result<Query<TermParams>, QueryRejection>,
    ctx: RequestContext,
) -> Result<Json<ResultsResponse>> {
    let Query(params) = params?;
    let results = source(&state, &source_name)?
        .search(&params.term, &ctx)
        .await;

    Ok(Json(ResultsResponse { results }))
}

/// Reverse lookup of a number or address.
async fn reverse(
    State(state): State<Arc<AppState>>,
    Path(source_name): Path<String>,
    params: std::result::Result<Query<TermParams>, QueryRejection>,
    ctx: RequestContext,
) -> Result<Json<ReverseResponse>> {
    let Query(params) = params?;
    let result = source(&state, &source_name)?
        .first_match(&params.term, &ctx)
        .await?;

    Ok(Json(ReverseResponse { result }))
}

/// Contacts by id (favorites).
async fn list_by_ids(
    State(state): State<Arc<AppState>>,
    Path(source_name): Path<String>,
    ctx: RequestContext,
    request: std::result::Result<Json<ListRequest>, JsonRejection>,
) -> Result<Json<ResultsResponse>> {
    let Json(request) = request?;
    let results = source(&state, &source_name)?
        .list(&request.ids, &ctx)
        .await?;

    Ok(Json(ResultsResponse { results }))
}
