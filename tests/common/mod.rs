#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{TimeZone, Utc};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use tower::ServiceExt;

use theatre_api::config::{AppConfig, Config, DatabaseConfig, JwtConfig, PasswordConfig};
use theatre_api::models::{
    ActorInput, GenreInput, Hall, HallInput, NewUser, Performance, PerformanceInput, Play, PlayInput, User,
};
use theatre_api::services::TokenKind;
use theatre_api::store::{CatalogStore, MemoryStore, UserStore};
use theatre_api::AppState;

pub fn test_config() -> Config {
    Config {
        app: AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            rust_log: "theatre_api=debug".to_string(),
            log_json: false,
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            pool_size: 1,
            connect_attempts: 1,
        },
        jwt: JwtConfig {
            secret: "test-jwt-secret".to_string(),
            access_ttl_minutes: 5,
            refresh_ttl_hours: 1,
        },
        // bcrypt's minimum cost keeps hashing fast
        password: PasswordConfig { bcrypt_cost: 4 },
        admin: None,
    }
}

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(test_config(), store.clone());
        Self { store, state }
    }

    pub fn router(&self) -> axum::Router {
        theatre_api::app(self.state.clone())
    }

    pub async fn user(&self, email: &str, is_staff: bool) -> User {
        self.store
            .create_user(&NewUser {
                email: email.to_string(),
                password_hash: "not-a-real-hash".to_string(),
                first_name: FirstName().fake(),
                last_name: LastName().fake(),
                is_staff,
            })
            .await
            .expect("create user")
    }

    pub fn access_token(&self, user: &User) -> String {
        self.state.tokens.issue(user, TokenKind::Access).expect("issue token")
    }

    /// Hall "Main" (5 rows of 10), one play and one performance in it.
    pub async fn seed_performance(&self) -> (Hall, Play, Performance) {
        let hall = self
            .store
            .create_hall(&HallInput { name: "Main".to_string(), rows: 5, seats_in_row: 10 })
            .await
            .expect("create hall");
        let genre = self
            .store
            .create_genre(&GenreInput { name: "Tragedy".to_string() })
            .await
            .expect("create genre");
        let actor = self
            .store
            .create_actor(&ActorInput { first_name: FirstName().fake(), last_name: LastName().fake() })
            .await
            .expect("create actor");
        let play = self
            .store
            .create_play(&PlayInput {
                title: "Hamlet".to_string(),
                description: "Prince of Denmark".to_string(),
                actors: vec![actor.id],
                genres: vec![genre.id],
            })
            .await
            .expect("create play");
        let performance = self
            .store
            .create_performance(&PerformanceInput {
                play_id: play.id,
                hall_id: hall.id,
                show_time: Utc.with_ymd_and_hms(2030, 5, 1, 19, 0, 0).unwrap(),
            })
            .await
            .expect("create performance");
        (hall, play, performance)
    }
}

pub async fn send(
    router: axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(v) => Body::from(serde_json::to_vec(&v).expect("serialize body")),
        None => Body::empty(),
    };

    let response = router
        .oneshot(builder.body(body).expect("build request"))
        .await
        .expect("infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}
