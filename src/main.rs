use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;
use std::time::Duration;

use letsgo_auth::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{BankAccountResolver, PaystackService, SmsGateway, TwilioService},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

/// 启动阶段的错误直接记录并以非零状态退出
fn startup_error(stage: &str) -> impl FnOnce(letsgo_auth::AppError) -> std::io::Error + '_ {
    move |e| {
        log::error!("{stage} failed: {e}");
        std::io::Error::other(format!("{stage} failed: {e}"))
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置（缺少签名密钥等必填项时拒绝启动）
    let config = Config::from_toml().map_err(startup_error("Loading configuration"))?;

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .map_err(startup_error("Connecting to database"))?;

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .map_err(startup_error("Running database migrations"))?;

    // 创建JWT服务
    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.expires_in);

    // 创建外部服务
    let sms_gateway: Arc<dyn SmsGateway> = Arc::new(
        TwilioService::new(
            config.twilio.clone(),
            Duration::from_secs(config.otp.sms_timeout_secs),
        )
        .map_err(startup_error("Creating Twilio client"))?,
    );
    let paystack = PaystackService::new(config.paystack.clone())
        .map_err(startup_error("Creating Paystack client"))?;
    if !paystack.is_enabled() {
        log::warn!("PAYSTACK_SECRET_KEY is not set, bank verification will fail");
    }
    let bank_resolver: Arc<dyn BankAccountResolver> = Arc::new(paystack);

    // 创建服务
    let account_service = AccountService::new(pool.clone());
    let otp_service = OtpService::new(pool.clone(), sms_gateway, config.otp.ttl_secs);
    let auth_service = AuthService::new(
        pool.clone(),
        jwt_service.clone(),
        otp_service,
        account_service.clone(),
    );
    let bank_service = BankService::new(pool.clone(), bank_resolver);

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(handlers::json_config())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(account_service.clone()))
            .app_data(web::Data::new(bank_service.clone()))
            .configure(swagger_config)
            .route("/", web::get().to(handlers::index))
            .configure(handlers::auth_config)
    })
    .shutdown_timeout(config.server.shutdown_timeout_secs)
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
