use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{LinkedBankAccount, UserRole};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::index,
        handlers::auth::request_otp,
        handlers::auth::verify_otp,
        handlers::auth::get_profile,
        handlers::auth::verify_bank,
    ),
    components(
        schemas(
            RequestOtpRequest,
            RequestOtpResponse,
            VerifyOtpRequest,
            UserResponse,
            AuthResponse,
            ProfileResponse,
            VerifyBankRequest,
            VerifyBankResponse,
            UserRole,
            LinkedBankAccount,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Phone OTP authentication API"),
        (name = "health", description = "Service health"),
    ),
    info(
        title = "LetsGo API",
        version = "1.0.0",
        description = "LetsGo phone authentication and wallet onboarding API"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
