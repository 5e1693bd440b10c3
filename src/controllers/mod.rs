pub mod catalog;
pub mod performances;
pub mod plays;
pub mod reservations;
pub mod users;

use axum::Router;
use std::sync::Arc;

use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    let theatre = Router::new()
        .merge(catalog::routes())
        .merge(plays::routes())
        .merge(performances::routes())
        .merge(reservations::routes());

    Router::new()
        .nest("/theatre", theatre)
        .nest("/user", users::routes())
}
