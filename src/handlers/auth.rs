use crate::middlewares::current_claims;
use crate::models::*;
use crate::services::{AccountService, AuthService, BankService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/auth/request-otp",
    tag = "auth",
    request_body = RequestOtpRequest,
    responses(
        (status = 200, description = "验证码已发送", body = RequestOtpResponse),
        (status = 400, description = "手机号或姓名不合法"),
        (status = 500, description = "短信发送失败")
    )
)]
pub async fn request_otp(
    auth_service: web::Data<AuthService>,
    request: web::Json<RequestOtpRequest>,
) -> Result<HttpResponse> {
    match auth_service.request_otp(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            response,
            "OTP sent successfully",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/verify-otp",
    tag = "auth",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "登录成功", body = AuthResponse),
        (status = 400, description = "验证码无效或已过期")
    )
)]
pub async fn verify_otp(
    auth_service: web::Data<AuthService>,
    request: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse> {
    match auth_service.verify_otp(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            response,
            "Login successful",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/auth/profile",
    tag = "auth",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取资料成功", body = ProfileResponse),
        (status = 401, description = "未登录或令牌过期"),
        (status = 404, description = "用户不存在")
    )
)]
pub async fn get_profile(
    account_service: web::Data<AccountService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let result = async {
        let user_id = current_claims(&req)?.user_id()?;
        account_service.get_profile(user_id).await
    }
    .await;

    match result {
        Ok(profile) => Ok(HttpResponse::Ok().json(ApiResponse::success(profile))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/verify-bank",
    tag = "auth",
    request_body = VerifyBankRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "银行账户已校验", body = VerifyBankResponse),
        (status = 400, description = "账户信息无效"),
        (status = 401, description = "未登录或令牌过期"),
        (status = 404, description = "钱包不存在"),
        (status = 500, description = "银行校验服务不可用")
    )
)]
pub async fn verify_bank(
    bank_service: web::Data<BankService>,
    req: HttpRequest,
    request: web::Json<VerifyBankRequest>,
) -> Result<HttpResponse> {
    let result = async {
        let user_id = current_claims(&req)?.user_id()?;
        bank_service
            .verify_bank_account(user_id, request.into_inner())
            .await
    }
    .await;

    match result {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            response,
            "Bank account verified",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/request-otp", web::post().to(request_otp))
            .route("/verify-otp", web::post().to(verify_otp))
            .route("/profile", web::get().to(get_profile))
            .route("/verify-bank", web::post().to(verify_bank)),
    );
}
