use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyDeleted(String),

    #[error("Meal with name '{0}' already exists")]
    DuplicateName(String),

    #[error("The meal database is empty")]
    EmptyCatalog,

    #[error("{0}")]
    State(String),

    #[error("Database error: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::EmptyCatalog => StatusCode::NOT_FOUND,
            AppError::AlreadyDeleted(_) => StatusCode::GONE,
            AppError::DuplicateName(_) | AppError::State(_) => StatusCode::CONFLICT,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
