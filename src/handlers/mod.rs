pub mod auth;

pub use auth::auth_config;

use crate::error::AppError;
use actix_web::{HttpResponse, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses(
        (status = 200, description = "服务可用")
    )
)]
pub async fn index() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "message": "Welcome to LetsGo API"
    })))
}

/// 请求体无法解析时按校验错误返回统一信封
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| {
            AppError::ValidationError(format!("Invalid request body: {err}")).into()
        })
}
