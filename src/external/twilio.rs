use crate::config::TwilioConfig;
use crate::error::{AppError, AppResult};
use crate::external::SmsGateway;
use crate::utils::mask_phone;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct SendSmsResponse {
    pub sid: String,
    pub status: String,
    pub error_code: Option<i64>,
    pub error_message: Option<String>,
}

#[derive(Clone)]
pub struct TwilioService {
    client: Client,
    config: TwilioConfig,
}

impl TwilioService {
    pub fn new(config: TwilioConfig, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent("letsgo-auth/twilio")
            .timeout(timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        )
    }
}

#[async_trait]
impl SmsGateway for TwilioService {
    async fn send(&self, phone: &str, message: &str) -> AppResult<()> {
        let params = [
            ("To", phone),
            ("From", self.config.from_phone.as_str()),
            ("Body", message),
        ];

        // 超时或网络错误都视为投递失败，不挂起请求
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::MessagingFailure(format!("SMS request failed: {e}")))?;

        if response.status().is_success() {
            let sid = response
                .json::<SendSmsResponse>()
                .await
                .map(|r| r.sid)
                .unwrap_or_default();
            log::info!("SMS sent to {} (sid={})", mask_phone(phone), sid);
            Ok(())
        } else {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!(
                "SMS to {} failed with {}: {}",
                mask_phone(phone),
                status,
                error_text
            );
            Err(AppError::MessagingFailure(format!(
                "Twilio returned {status}: {error_text}"
            )))
        }
    }
}
