use crate::error::AppResult;
use async_trait::async_trait;

/// 短信发送能力。失败必须返回 AppError::MessagingFailure，
/// 以便与参数校验错误区分。
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, phone: &str, message: &str) -> AppResult<()>;
}
