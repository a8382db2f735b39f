use actix_web::{error, http::StatusCode, web, HttpResponse, ResponseError};
use application::error::AppError;
use domain::user::UserError;
use log::error;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every failure leaving the HTTP layer goes through this type,
/// so each error kind maps to exactly one status code.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    TooManyRequests(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::TooManyRequests(_) => "TOO_MANY_REQUESTS",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn internal(detail: String) -> Self {
        error!("internal error: {}", detail);
        Self::Internal(detail)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidInput(msg) => Self::InvalidInput(msg),
            AppError::Conflict(msg) => Self::Conflict(msg),
            AppError::AggregateNotFound(kind, id) => {
                Self::NotFound(format!("{} {} not found", kind, id))
            }
            AppError::AuthError(msg) => Self::Unauthorized(msg),
            AppError::Forbidden(msg) => Self::Forbidden(msg),
            AppError::UserError(e) => e.into(),
            AppError::UnknownError(msg) => Self::internal(msg),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => Self::NotFound(format!("User {} not found", id)),
            UserError::LoginTaken(login) => {
                Self::Conflict(format!("login '{}' already exists", login))
            }
            UserError::InvalidInput(msg) => Self::InvalidInput(msg),
            UserError::DbErr(msg) => Self::internal(msg),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // 内部错误只记录日志，不回显给客户端
        let message = match self {
            Self::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.kind().to_string(),
            message,
        })
    }
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| error::Error::from(ApiError::InvalidInput(err.to_string())))
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        error::Error::from(ApiError::NotFound(format!("no such resource: {}", err)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                AppError::AggregateNotFound("User".into(), "1".into()),
                StatusCode::NOT_FOUND,
            ),
            (AppError::AuthError("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (
                AppError::UserError(UserError::LoginTaken("a".into())),
                StatusCode::CONFLICT,
            ),
            (
                AppError::UserError(UserError::DbErr("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AppError::UnknownError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (app_err, status) in cases {
            assert_eq!(ApiError::from(app_err).status_code(), status);
        }
    }

    #[actix_web::test]
    async fn test_internal_error_is_not_echoed() {
        let err = ApiError::from(UserError::DbErr("relation users does not exist".into()));
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.error, "INTERNAL_ERROR");
        assert_eq!(body.message, "internal server error");
    }
}
