use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use crate::models::ApiResponse;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

pub const INVALID_OR_EXPIRED_OTP: &str = "Invalid or expired OTP";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid or expired OTP")]
    InvalidOrExpiredOtp,

    #[error("Bank account could not be resolved")]
    BankAccountUnresolved,

    #[error("Auth required: {0}")]
    AuthRequired(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Messaging failure: {0}")]
    MessagingFailure(String),

    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::InvalidOrExpiredOtp => (
                StatusCode::BAD_REQUEST,
                "INVALID_OTP",
                INVALID_OR_EXPIRED_OTP.to_string(),
            ),
            AppError::BankAccountUnresolved => (
                StatusCode::BAD_REQUEST,
                "BANK_ACCOUNT_UNRESOLVED",
                "Invalid account details".to_string(),
            ),
            AppError::AuthRequired(msg) => {
                (StatusCode::UNAUTHORIZED, "AUTH_REQUIRED", msg.clone())
            }
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_EXPIRED",
                "Session token expired".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::MessagingFailure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MESSAGING_ERROR",
                "Server error".to_string(),
            ),
            AppError::UpstreamFailure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "UPSTREAM_ERROR",
                "Bank verification failed".to_string(),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Server error".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Server error".to_string(),
            ),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = self.parts();

        // 客户端错误只记 warn，服务端错误记录原始原因但不返回给客户端
        if status_code.is_server_error() {
            log::error!("{error_code}: {self}");
        } else {
            log::warn!("{error_code}: {self}");
        }

        HttpResponse::build(status_code).json(ApiResponse::error(error_code, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::ValidationError("bad phone".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidOrExpiredOtp.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::MessagingFailure("twilio down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::UpstreamFailure("paystack down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_do_not_leak_cause() {
        let (_, code, message) =
            AppError::DatabaseError(sea_orm::DbErr::Custom("connection refused".into())).parts();
        assert_eq!(code, "DATABASE_ERROR");
        assert_eq!(message, "Server error");

        let (_, _, message) = AppError::MessagingFailure("401 from twilio".into()).parts();
        assert!(!message.contains("twilio"));
    }
}
