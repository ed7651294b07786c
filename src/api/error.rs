//! Request boundary errors and their wire representation

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::store::StoreError;

/// Anything that stops a request before or while reaching the registry
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Too many requests, please try again later.")]
    RateLimited { retry_after: Duration },

    #[error("Missing required parameter: {0}")]
    MissingParam(&'static str),

    #[error("Invalid coordinates")]
    InvalidCoordinates,

    #[error("Invalid request body")]
    InvalidBody,

    /// The document store failed; `message` is the operation's public error text
    #[error("{message}")]
    Store {
        message: &'static str,
        #[source]
        source: StoreError,
    },

    /// The blocking worker running the operation went away
    #[error("{0}")]
    Worker(&'static str),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::MissingParam(_) | ApiError::InvalidCoordinates | ApiError::InvalidBody => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Store { .. } | ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let ApiError::RateLimited { retry_after } = self {
            let secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
            builder.insert_header(("Retry-After", secs.to_string()));
        }
        builder.json(json!({ "error": self.to_string() }))
    }
}
