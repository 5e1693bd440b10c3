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
use crate::filters::{PlayFilter, PlayQuery};
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::models::{Play, PlayDetail, PlayInput, PlayListItem};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/plays", get(list_plays).post(create_play))
        .route("/plays/{id}", get(get_play).put(update_play).delete(delete_play))
}

// GET /api/theatre/plays?title=ham&genres=1,2&actors=3
async fn list_plays(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(query): Query<PlayQuery>,
) -> Result<Json<Vec<PlayListItem>>> {
    let filter = PlayFilter::try_from(query)?;
    Ok(Json(state.catalog.list_plays(viewer.as_ref(), &filter).await?))
}

async fn get_play(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<i64>,
) -> Result<Json<PlayDetail>> {
    Ok(Json(state.catalog.get_play(viewer.as_ref(), id).await?))
}

async fn create_play(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Json(input): Json<PlayInput>,
) -> Result<impl IntoResponse> {
    let play = state.catalog.create_play(&ctx, &input).await?;
    Ok((StatusCode::CREATED, Json(play)))
}

async fn update_play(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<i64>,
    Json(input): Json<PlayInput>,
) -> Result<Json<Play>> {
    Ok(Json(state.catalog.update_play(&ctx, id, &input).await?))
}

async fn delete_play(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.catalog.delete_play(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
