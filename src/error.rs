//! Error taxonomy shared by the stores, the services and the HTTP layer.
//!
//! Services return [`Error`] untranslated; only [`IntoResponse`] turns it
//! into a status code and JSON body.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::{format_places, Place};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Malformed or out-of-range input. `places` lists offending seats when
    /// the problem is about seat coordinates.
    #[error("{message}")]
    Validation { message: String, places: Vec<Place> },

    /// Uniqueness violation: seat already sold, duplicate name, hall busy.
    #[error("{message}")]
    Conflict { message: String, places: Vec<Place> },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into(), places: Vec::new() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into(), places: Vec::new() }
    }

    pub fn seats_out_of_range(places: Vec<Place>) -> Self {
        Self::Validation {
            message: format!("seats outside the hall: {}", format_places(&places)),
            places,
        }
    }

    pub fn seats_taken(places: Vec<Place>) -> Self {
        Self::Conflict {
            message: format!("seats already taken: {}", format_places(&places)),
            places,
        }
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized("authentication credentials were not provided or are invalid".to_string())
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("you do not have permission to perform this action".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Unauthorized(_) | Error::Token(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Storage(_) | Error::Hashing(_) | Error::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::Validation { .. } => "validation_error",
            Error::Conflict { .. } => "conflict",
            Error::Unauthorized(_) | Error::Token(_) => "unauthorized",
            Error::Forbidden(_) => "forbidden",
            Error::Storage(_) | Error::Hashing(_) | Error::Task(_) => "internal",
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reasons = errs
                    .iter()
                    .map(|e| e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}: {}", field, reasons)
            })
            .collect();
        fields.sort();
        Self::validation(fields.join("; "))
    }
}

// Malformed bodies, path segments and query strings are client input errors
impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    seats: Vec<Place>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!("request failed: {}", self);
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        let code = self.code();
        let seats = match self {
            Error::Validation { places, .. } | Error::Conflict { places, .. } => places,
            _ => Vec::new(),
        };

        (status, Json(ErrorBody { error: code, message, seats })).into_response()
    }
}
