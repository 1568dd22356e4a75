use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::service::{BracketError, TournamentError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Internal server error")]
    InternalServerError,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
    details: Option<String>,
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let (status, message) = match self {
            ApiError::InternalServerError => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                self.to_string(),
            ),
            ApiError::BadRequest(_) => (actix_web::http::StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NotFound => (actix_web::http::StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Conflict(_) => (actix_web::http::StatusCode::CONFLICT, self.to_string()),
            ApiError::DatabaseError(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            ApiError::ValidationError(_) => {
                (actix_web::http::StatusCode::BAD_REQUEST, self.to_string())
            }
        };

        let error_response = ErrorResponse {
            error: message,
            code: status.as_u16(),
            details: Some(self.to_string()),
        };

        HttpResponse::build(status).json(error_response)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => ApiError::DatabaseError(e),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
        }
    }
}

impl From<BracketError> for ApiError {
    fn from(err: BracketError) -> Self {
        match err {
            BracketError::TournamentNotFound | BracketError::MatchNotFound => ApiError::NotFound,
            BracketError::InvalidWinner(_) => ApiError::BadRequest(err.to_string()),
            BracketError::AlreadyDecided | BracketError::AlreadySeeded => {
                ApiError::Conflict(err.to_string())
            }
            BracketError::InvalidField(msg) => ApiError::BadRequest(msg),
            BracketError::Storage(store_err) => store_err.into(),
        }
    }
}

impl From<TournamentError> for ApiError {
    fn from(err: TournamentError) -> Self {
        match err {
            TournamentError::NotFound => ApiError::NotFound,
            TournamentError::Validation(msg) => ApiError::ValidationError(msg),
            TournamentError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            TournamentError::Storage(store_err) => store_err.into(),
        }
    }
}
