//! HTTP mapping for `AppError`. Every error leaves the API as a structured
//! JSON body: `{"error": <kind>, "message": <text>}`.

use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use lg_core::error::AppError;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self.0 {
            AppError::NotFound(..) => "not_found",
            AppError::ValidationError(_) => "validation_error",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Conflict(_) => "conflict",
            AppError::RateLimitExceeded(_) => "rate_limited",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Store failures are logged server-side; the client gets no detail.
        let message = match &self.0 {
            AppError::Internal(detail) => {
                log::error!("internal error: {detail}");
                "internal service error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (AppError::not_found("Gallery", "x"), StatusCode::NOT_FOUND),
            (AppError::ValidationError("v".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized("u".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("f".into()), StatusCode::FORBIDDEN),
            (AppError::Conflict("c".into()), StatusCode::CONFLICT),
            (
                AppError::RateLimitExceeded("r".into()),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                AppError::Internal("i".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status_code(), status);
        }
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let response = ApiError(AppError::Internal("db password wrong".into())).error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
