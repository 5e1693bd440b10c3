//! Registration, profile and JWT endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::error::Result;
use crate::extract::Json;
use crate::middleware::AuthUser;
use crate::models::{Credentials, ProfileUpdate, RegisterInput, User};
use crate::services::TokenPair;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub access: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/me", get(me).patch(update_me))
        .route("/token", post(obtain_tokens))
        .route("/token/refresh", post(refresh))
        .route("/token/verify", post(verify))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(input): Json<RegisterInput>,
) -> Result<impl IntoResponse> {
    let user = state.users.register(&input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn me(State(state): State<Arc<AppState>>, AuthUser(ctx): AuthUser) -> Result<Json<User>> {
    Ok(Json(state.users.me(&ctx).await?))
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    Ok(Json(state.users.update_me(&ctx, &update).await?))
}

async fn obtain_tokens(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<TokenPair>> {
    Ok(Json(state.users.obtain_tokens(&credentials).await?))
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<AccessResponse>> {
    let access = state.users.refresh(&body.refresh).await?;
    Ok(Json(AccessResponse { access }))
}

async fn verify(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<serde_json::Value>> {
    state.users.verify(&body.token)?;
    Ok(Json(json!({})))
}
