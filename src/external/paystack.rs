use crate::config::PaystackConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct ResolveAccountResponse {
    pub status: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<ResolvedAccount>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ResolvedAccount {
    pub account_number: String,
    pub account_name: String,
}

/// 银行账户名解析。Ok(None) 表示对方明确无法解析该账户。
#[async_trait]
pub trait BankAccountResolver: Send + Sync {
    async fn resolve_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> AppResult<Option<ResolvedAccount>>;
}

#[derive(Clone)]
pub struct PaystackService {
    http: Client,
    cfg: PaystackConfig,
}

impl PaystackService {
    pub fn new(cfg: PaystackConfig) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("letsgo-auth/paystack")
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self { http, cfg })
    }

    pub fn is_enabled(&self) -> bool {
        !self.cfg.secret_key.is_empty()
    }
}

#[async_trait]
impl BankAccountResolver for PaystackService {
    async fn resolve_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> AppResult<Option<ResolvedAccount>> {
        if !self.is_enabled() {
            return Err(AppError::UpstreamFailure(
                "Paystack secret key is not configured".to_string(),
            ));
        }

        let url = format!("{}/bank/resolve", self.cfg.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.cfg.secret_key)
            .query(&[("account_number", account_number), ("bank_code", bank_code)])
            .send()
            .await
            .map_err(|e| AppError::UpstreamFailure(format!("Paystack request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AppError::UpstreamFailure(format!("Paystack body read failed: {e}")))?;

        interpret_resolve_response(status, &body)
    }
}

/// 4xx 且 status=false 视为账户无法解析；5xx、鉴权失败、无法解析的响应体视为上游故障
fn interpret_resolve_response(
    status: StatusCode,
    body: &str,
) -> AppResult<Option<ResolvedAccount>> {
    if status.is_server_error()
        || status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
    {
        return Err(AppError::UpstreamFailure(format!(
            "Paystack returned {status}: {body}"
        )));
    }

    let parsed: ResolveAccountResponse = serde_json::from_str(body).map_err(|e| {
        AppError::UpstreamFailure(format!("Unexpected Paystack response ({status}): {e}"))
    })?;

    if !parsed.status {
        log::warn!(
            "Paystack could not resolve account: {}",
            parsed.message.unwrap_or_default()
        );
        return Ok(None);
    }

    match parsed.data {
        Some(account) if !account.account_name.trim().is_empty() => Ok(Some(account)),
        _ => Ok(None),
    }
}
