use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::error::Result;
use crate::extract::{Json, Path, Query};
use crate::filters::{PerformanceFilter, PerformanceQuery};
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::models::{Performance, PerformanceDetail, PerformanceInput, PerformanceSummary};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/performances", get(list_performances).post(create_performance))
        .route(
            "/performances/{id}",
            get(get_performance).put(update_performance).delete(delete_performance),
        )
}

// GET /api/theatre/performances?date=2024-05-01&play=4
async fn list_performances(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(query): Query<PerformanceQuery>,
) -> Result<Json<Vec<PerformanceSummary>>> {
    let filter = PerformanceFilter::try_from(query)?;
    Ok(Json(state.catalog.list_performances(viewer.as_ref(), &filter).await?))
}

// Detail includes the seats already sold
async fn get_performance(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<i64>,
) -> Result<Json<PerformanceDetail>> {
    Ok(Json(state.catalog.get_performance(viewer.as_ref(), id).await?))
}

async fn create_performance(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Json(input): Json<PerformanceInput>,
) -> Result<impl IntoResponse> {
    let performance = state.catalog.create_performance(&ctx, &input).await?;
    Ok((StatusCode::CREATED, Json(performance)))
}

async fn update_performance(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<i64>,
    Json(input): Json<PerformanceInput>,
) -> Result<Json<Performance>> {
    Ok(Json(state.catalog.update_performance(&ctx, id, &input).await?))
}

async fn delete_performance(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.catalog.delete_performance(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
