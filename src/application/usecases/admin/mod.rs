pub mod dashboard;
pub mod taxonomy;
pub mod uploads;
pub mod videos;

use axum::http::StatusCode;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AdminError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdminError::Validation(_) => StatusCode::BAD_REQUEST,
            AdminError::NotFound(_) => StatusCode::NOT_FOUND,
            AdminError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Maps a failed insert or update; slug columns are unique.
pub(crate) fn write_error(err: anyhow::Error) -> AdminError {
    match err.downcast_ref::<DieselError>() {
        Some(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            AdminError::Validation("Slug already exists".to_string())
        }
        _ => AdminError::Internal(err),
    }
}

pub type UseCaseResult<T> = std::result::Result<T, AdminError>;

#[cfg(test)]
pub(crate) fn unique_violation() -> anyhow::Error {
    anyhow::Error::from(DieselError::DatabaseError(
        DatabaseErrorKind::UniqueViolation,
        Box::new(String::from("duplicate key value violates unique constraint")),
    ))
}
