//! Halls, actors and genres: plain CRUD.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::error::Result;
use crate::extract::{Json, Path};
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::models::{Actor, ActorInput, Genre, GenreInput, Hall, HallInput};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/halls", get(list_halls).post(create_hall))
        .route("/halls/{id}", get(get_hall).put(update_hall).delete(delete_hall))
        .route("/actors", get(list_actors).post(create_actor))
        .route("/actors/{id}", get(get_actor).put(update_actor).delete(delete_actor))
        .route("/genres", get(list_genres).post(create_genre))
        .route("/genres/{id}", get(get_genre).put(update_genre).delete(delete_genre))
}

/* ---------- HALLS ---------- */

async fn list_halls(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
) -> Result<Json<Vec<Hall>>> {
    Ok(Json(state.catalog.list_halls(viewer.as_ref()).await?))
}

async fn get_hall(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Hall>> {
    Ok(Json(state.catalog.get_hall(viewer.as_ref(), id).await?))
}

async fn create_hall(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Json(input): Json<HallInput>,
) -> Result<impl IntoResponse> {
    let hall = state.catalog.create_hall(&ctx, &input).await?;
    Ok((StatusCode::CREATED, Json(hall)))
}

async fn update_hall(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<i64>,
    Json(input): Json<HallInput>,
) -> Result<Json<Hall>> {
    Ok(Json(state.catalog.update_hall(&ctx, id, &input).await?))
}

async fn delete_hall(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.catalog.delete_hall(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/* ---------- ACTORS ---------- */

async fn list_actors(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
) -> Result<Json<Vec<Actor>>> {
    Ok(Json(state.catalog.list_actors(viewer.as_ref()).await?))
}

async fn get_actor(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Actor>> {
    Ok(Json(state.catalog.get_actor(viewer.as_ref(), id).await?))
}

async fn create_actor(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Json(input): Json<ActorInput>,
) -> Result<impl IntoResponse> {
    let actor = state.catalog.create_actor(&ctx, &input).await?;
    Ok((StatusCode::CREATED, Json(actor)))
}

async fn update_actor(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<i64>,
    Json(input): Json<ActorInput>,
) -> Result<Json<Actor>> {
    Ok(Json(state.catalog.update_actor(&ctx, id, &input).await?))
}

async fn delete_actor(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.catalog.delete_actor(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/* ---------- GENRES ---------- */

async fn list_genres(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
) -> Result<Json<Vec<Genre>>> {
    Ok(Json(state.catalog.list_genres(viewer.as_ref()).await?))
}

async fn get_genre(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Genre>> {
    Ok(Json(state.catalog.get_genre(viewer.as_ref(), id).await?))
}

async fn create_genre(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Json(input): Json<GenreInput>,
) -> Result<impl IntoResponse> {
    let genre = state.catalog.create_genre(&ctx, &input).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

async fn update_genre(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<i64>,
    Json(input): Json<GenreInput>,
) -> Result<Json<Genre>> {
    Ok(Json(state.catalog.update_genre(&ctx, id, &input).await?))
}

async fn delete_genre(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.catalog.delete_genre(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
