pub mod config;
pub mod context;
pub mod controllers;
pub mod database;
pub mod error;
pub mod extract;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod seat_map;
pub mod services;
pub mod store;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use services::{BookingService, CatalogService, TokenService, UserService};
use store::{PgStore, Store};

// Shared state for every handler
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub tokens: TokenService,
    pub catalog: CatalogService,
    pub booking: BookingService,
    pub users: UserService,
}

impl AppState {
    pub fn new(config: config::Config, store: Arc<dyn Store>) -> Arc<Self> {
        let tokens = TokenService::new(&config.jwt);
        Arc::new(Self {
            catalog: CatalogService::new(store.clone()),
            booking: BookingService::new(store.clone()),
            users: UserService::new(store, tokens.clone(), config.password.bcrypt_cost),
            tokens,
            config,
        })
    }

    /// Connects to Postgres, applies migrations and seeds the staff account.
    pub async fn connect(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::wait_for(&config.database).await?;
        info!("Database connected");

        db.migrate().await?;

        let state = Self::new(config, Arc::new(PgStore::new(db.pool.clone())));
        if let Some(admin) = &state.config.admin {
            state.users.ensure_admin(admin).await?;
        }
        Ok(state)
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Theatre API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
