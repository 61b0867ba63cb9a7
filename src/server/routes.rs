use std::sync::Arc;

use axum::http::Method;
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{reject_write, stats_query, table_query, AppState};
use crate::query::QueryRunner;

pub fn create_router(runner: QueryRunner) -> Router {
    let state = AppState {
        runner: Arc::new(runner),
    };

    Router::new()
        .route(
            "/api/now/table/{table}",
            get(table_query)
                .post(reject_write)
                .put(reject_write)
                .patch(reject_write)
                .delete(reject_write),
        )
        .route(
            "/api/now/stats/{table}",
            get(stats_query)
                .post(reject_write)
                .put(reject_write)
                .patch(reject_write)
                .delete(reject_write),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers(Any),
        )
}
