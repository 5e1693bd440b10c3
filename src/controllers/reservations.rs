use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::extract::{Json, Path};
use crate::middleware::AuthUser;
use crate::models::{ReservationInput, ReservationView};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reservations", get(list_reservations).post(create_reservation))
        .route("/reservations/{id}", get(get_reservation).delete(cancel_reservation))
}

async fn list_reservations(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
) -> Result<Json<Vec<ReservationView>>> {
    Ok(Json(state.booking.list_reservations(&ctx).await?))
}

// POST /api/theatre/reservations
// {"performance_id": 1, "seats": [{"row": 1, "seat": 2}]}
async fn create_reservation(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Json(input): Json<ReservationInput>,
) -> Result<impl IntoResponse> {
    input.validate()?;
    let reservation = state
        .booking
        .create_reservation(&ctx, input.performance_id, &input.seats)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

async fn get_reservation(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ReservationView>> {
    Ok(Json(state.booking.get_reservation(&ctx, id).await?))
}

async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    AuthUser(ctx): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.booking.cancel_reservation(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
