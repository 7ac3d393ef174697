use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    pub twilio: TwilioConfig,
    #[serde(default)]
    pub paystack: PaystackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_jwt_expires_in")]
    pub expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    pub ttl_secs: i64,
    pub sms_timeout_secs: u64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            sms_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaystackConfig {
    pub secret_key: String,
    #[serde(default = "default_paystack_base_url")]
    pub base_url: String,
    #[serde(default = "default_paystack_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            base_url: default_paystack_base_url(),
            timeout_secs: default_paystack_timeout_secs(),
        }
    }
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_jwt_expires_in() -> i64 {
    7 * 24 * 3600
}

fn default_paystack_base_url() -> String {
    "https://api.paystack.co".to_string()
}

fn default_paystack_timeout_secs() -> u64 {
    10
}

impl Config {
    pub fn from_toml() -> AppResult<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => Self::from_toml_str(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL").ok_or_else(|| {
                    AppError::ConfigError(
                        "DATABASE_URL is not set and config.toml was not found".to_string(),
                    )
                })?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 5000u16),
                        shutdown_timeout_secs: get_env_parse(
                            "SERVER_SHUTDOWN_TIMEOUT",
                            default_shutdown_timeout_secs(),
                        ),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    // 签名密钥没有默认值，缺失时由 validate() 拒绝启动
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET").unwrap_or_default(),
                        expires_in: get_env_parse("JWT_EXPIRES_IN", default_jwt_expires_in()),
                    },
                    otp: OtpConfig {
                        ttl_secs: get_env_parse("OTP_TTL_SECS", 300i64),
                        sms_timeout_secs: get_env_parse("OTP_SMS_TIMEOUT_SECS", 5u64),
                    },
                    twilio: TwilioConfig {
                        account_sid: get_env("TWILIO_ACCOUNT_SID").unwrap_or_default(),
                        auth_token: get_env("TWILIO_AUTH_TOKEN").unwrap_or_default(),
                        from_phone: get_env("TWILIO_FROM_PHONE").unwrap_or_default(),
                    },
                    paystack: PaystackConfig {
                        secret_key: get_env("PAYSTACK_SECRET_KEY").unwrap_or_default(),
                        base_url: get_env("PAYSTACK_BASE_URL")
                            .unwrap_or_else(default_paystack_base_url),
                        timeout_secs: get_env_parse(
                            "PAYSTACK_TIMEOUT_SECS",
                            default_paystack_timeout_secs(),
                        ),
                    },
                }
            }
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "Failed to read config file {config_path}: {e}"
                )));
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_overrides(|name| env::var(name).ok());

        config.validate()?;
        Ok(config)
    }

    /// 用 lookup 提供的值覆盖已加载的配置，无法解析的数值忽略
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn parsed<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            name: &str,
        ) -> Option<T> {
            lookup(name).and_then(|v| v.parse().ok())
        }

        if let Some(v) = lookup("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(p) = parsed(&lookup, "SERVER_PORT") {
            self.server.port = p;
        }
        if let Some(t) = parsed(&lookup, "SERVER_SHUTDOWN_TIMEOUT") {
            self.server.shutdown_timeout_secs = t;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(mc) = parsed(&lookup, "DB_MAX_CONNECTIONS") {
            self.database.max_connections = mc;
        }
        if let Some(v) = lookup("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Some(n) = parsed(&lookup, "JWT_EXPIRES_IN") {
            self.jwt.expires_in = n;
        }
        if let Some(ttl) = parsed(&lookup, "OTP_TTL_SECS") {
            self.otp.ttl_secs = ttl;
        }
        if let Some(t) = parsed(&lookup, "OTP_SMS_TIMEOUT_SECS") {
            self.otp.sms_timeout_secs = t;
        }
        if let Some(v) = lookup("TWILIO_ACCOUNT_SID") {
            self.twilio.account_sid = v;
        }
        if let Some(v) = lookup("TWILIO_AUTH_TOKEN") {
            self.twilio.auth_token = v;
        }
        if let Some(v) = lookup("TWILIO_FROM_PHONE") {
            self.twilio.from_phone = v;
        }
        if let Some(v) = lookup("PAYSTACK_SECRET_KEY") {
            self.paystack.secret_key = v;
        }
        if let Some(v) = lookup("PAYSTACK_BASE_URL") {
            self.paystack.base_url = v;
        }
        if let Some(t) = parsed(&lookup, "PAYSTACK_TIMEOUT_SECS") {
            self.paystack.timeout_secs = t;
        }
    }

    pub fn from_toml_str(s: &str) -> AppResult<Self> {
        toml::from_str(s)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {e}")))
    }

    /// 启动前校验必填项
    pub fn validate(&self) -> AppResult<()> {
        if self.jwt.secret.trim().is_empty() {
            return Err(AppError::ConfigError(
                "jwt.secret (JWT_SECRET) must be set".to_string(),
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(AppError::ConfigError(
                "database.url (DATABASE_URL) must be set".to_string(),
            ));
        }
        if self.otp.ttl_secs <= 0 {
            return Err(AppError::ConfigError(
                "otp.ttl_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
