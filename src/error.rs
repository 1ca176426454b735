use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ShareError {
    #[error("Invalid file name")]
    InvalidName,

    #[error("{0} parameter missing")]
    MissingParameter(&'static str),

    #[error("{0} is empty")]
    EmptyValue(&'static str),

    #[error("File not found")]
    NotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found")]
    Unrouted,
}

impl ShareError {
    pub fn status(&self) -> StatusCode {
        match self {
            ShareError::InvalidName => StatusCode::FORBIDDEN,
            ShareError::MissingParameter(_) | ShareError::EmptyValue(_) => StatusCode::BAD_REQUEST,
            ShareError::NotFound | ShareError::Unrouted => StatusCode::NOT_FOUND,
            ShareError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ShareError {
    fn into_response(self) -> Response {
        let status = self.status();

        // I/O causes stay in the log
        let body = match &self {
            ShareError::Io(err) => {
                error!("Request failed: {}", err);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}
