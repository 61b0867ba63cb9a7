use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde_json::Value;

use crate::error::ApiError;
use crate::query::request::{decompose, Endpoint};
use crate::query::QueryRunner;

#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<QueryRunner>,
}

pub async fn table_query(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let request = decompose(Endpoint::Table, &table, &params)?;
    Ok(Json(state.runner.run(&request)?))
}

pub async fn stats_query(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let request = decompose(Endpoint::Stats, &table, &params)?;
    Ok(Json(state.runner.run(&request)?))
}

/// The mock dataset is read-only; every write verb is rejected.
pub async fn reject_write() -> ApiError {
    ApiError::Unsupported("write requests against the mock dataset".to_string())
}
