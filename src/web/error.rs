//! HTTP mapping for service errors.

use crate::error::ServiceError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Authorization(_) => StatusCode::FORBIDDEN,
            ServiceError::LimitExceeded(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::Consistency(_) | ServiceError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ServiceError::Validation(e) => json!({
                "error": e.message.clone().unwrap_or_else(|| "Validation failed".to_string()),
                "missing": e.missing,
                "out_of_range": e.out_of_range,
            }),
            ServiceError::NotFound(msg)
            | ServiceError::Authorization(msg)
            | ServiceError::LimitExceeded(msg) => json!({ "error": msg }),
            // Internal details stay in the log.
            ServiceError::Consistency(_) | ServiceError::Database(_) => {
                log::error!("{}", self);
                json!({ "error": "Internal server error" })
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
