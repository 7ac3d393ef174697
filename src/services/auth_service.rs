use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{AccountService, OtpService, normalize_full_name};
use crate::services::account_service::DEFAULT_FULL_NAME;
use crate::utils::*;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
    otp_service: OtpService,
    account_service: AccountService,
}

impl AuthService {
    pub fn new(
        pool: DatabaseConnection,
        jwt_service: JwtService,
        otp_service: OtpService,
        account_service: AccountService,
    ) -> Self {
        Self {
            pool,
            jwt_service,
            otp_service,
            account_service,
        }
    }

    /// 请求验证码（注册/登录共用）
    pub async fn request_otp(&self, request: RequestOtpRequest) -> AppResult<RequestOtpResponse> {
        // 校验在任何写操作之前完成
        let phone = PhoneNumber::parse(&request.phone)?;
        let full_name = normalize_full_name(request.full_name.as_deref())?;

        self.otp_service.issue(&phone).await?;

        self.account_service
            .ensure_placeholder(&self.pool, &phone, &full_name)
            .await?;

        Ok(RequestOtpResponse {
            expires_in: self.otp_service.ttl_secs(),
        })
    }

    /// 校验验证码并登录
    pub async fn verify_otp(&self, request: VerifyOtpRequest) -> AppResult<AuthResponse> {
        self.verify_otp_at(request, Utc::now()).await
    }

    pub(crate) async fn verify_otp_at(
        &self,
        request: VerifyOtpRequest,
        now: DateTime<Utc>,
    ) -> AppResult<AuthResponse> {
        // 格式不合法的手机号不可能有对应的验证码
        let phone =
            PhoneNumber::parse(&request.phone).map_err(|_| AppError::InvalidOrExpiredOtp)?;

        // 消费验证码与开户在同一事务内；任一步失败则验证码保持未使用
        let txn = self.pool.begin().await?;

        self.otp_service
            .consume(&txn, &phone, &request.otp, now)
            .await?;

        // 正常情况下请求验证码时已创建占位账户
        let user = self
            .account_service
            .ensure_placeholder(&txn, &phone, DEFAULT_FULL_NAME)
            .await?;

        let (user, wallet) = self
            .account_service
            .provision_wallet(&txn, user, now)
            .await?;

        txn.commit().await?;

        log::info!(
            "User {} verified {} (wallet {})",
            user.id,
            mask_phone(&user.phone),
            wallet.id
        );

        let token = self.jwt_service.generate_session_token(&user)?;

        Ok(AuthResponse {
            token,
            user: UserResponse::from(user),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        otp_challenge_entity as otp, user_entity as users, wallet_entity as wallets,
    };
    use crate::testing::{RecordingSms, setup_db};
    use chrono::Duration;
    use futures_util::future::join_all;
    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
    use std::sync::Arc;

    struct Harness {
        db: DatabaseConnection,
        sms: Arc<RecordingSms>,
        jwt: JwtService,
        auth: AuthService,
    }

    async fn harness_with(sms: RecordingSms) -> Harness {
        let db = setup_db().await;
        let sms = Arc::new(sms);
        let jwt = JwtService::new("test-secret", 7 * 24 * 3600);
        let auth = AuthService::new(
            db.clone(),
            jwt.clone(),
            OtpService::new(db.clone(), sms.clone(), 300),
            AccountService::new(db.clone()),
        );
        Harness { db, sms, jwt, auth }
    }

    async fn harness() -> Harness {
        harness_with(RecordingSms::default()).await
    }

    fn request(phone: &str) -> RequestOtpRequest {
        RequestOtpRequest {
            phone: phone.to_string(),
            full_name: Some("Ada Obi".to_string()),
        }
    }

    fn verify(phone: &str, otp: &str) -> VerifyOtpRequest {
        VerifyOtpRequest {
            phone: phone.to_string(),
            otp: otp.to_string(),
        }
    }

    #[tokio::test]
    async fn test_request_then_verify_issues_token_and_wallet() {
        let h = harness().await;

        let sent = h.auth.request_otp(request("08031234567")).await.unwrap();
        assert_eq!(sent.expires_in, 300);
        let code = h.sms.last_code().unwrap();

        let response = h.auth.verify_otp(verify("08031234567", &code)).await.unwrap();
        assert_eq!(response.user.phone, "+2348031234567");
        assert_eq!(response.user.full_name, "Ada Obi");
        assert!(response.user.wallet_id.is_some());

        let claims = h.jwt.verify_session_token(&response.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), response.user.id);
        assert_eq!(claims.phone, "+2348031234567");
    }

    #[tokio::test]
    async fn test_invalid_phone_is_rejected_without_persisting() {
        let h = harness().await;

        let result = h.auth.request_otp(request("12345")).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert_eq!(otp::Entity::find().count(&h.db).await.unwrap(), 0);
        assert_eq!(h.sms.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_reused_code_is_rejected() {
        let h = harness().await;
        h.auth.request_otp(request("08031234567")).await.unwrap();
        let code = h.sms.last_code().unwrap();

        h.auth.verify_otp(verify("08031234567", &code)).await.unwrap();
        let second = h.auth.verify_otp(verify("08031234567", &code)).await;
        assert!(matches!(second, Err(AppError::InvalidOrExpiredOtp)));
    }

    #[tokio::test]
    async fn test_both_forms_of_number_reach_same_account() {
        let h = harness().await;
        h.auth.request_otp(request("08031234567")).await.unwrap();
        let first_code = h.sms.last_code().unwrap();
        let first = h
            .auth
            .verify_otp(verify("+2348031234567", &first_code))
            .await
            .unwrap();

        h.auth.request_otp(request("+2348031234567")).await.unwrap();
        let second_code = h.sms.last_code().unwrap();
        let second = h
            .auth
            .verify_otp(verify("08031234567", &second_code))
            .await
            .unwrap();

        assert_eq!(first.user.id, second.user.id);
        assert_eq!(first.user.wallet_id, second.user.wallet_id);
        assert_eq!(wallets::Entity::find().count(&h.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expired_code_is_rejected() {
        let h = harness().await;
        h.auth.request_otp(request("08031234567")).await.unwrap();
        let code = h.sms.last_code().unwrap();
        let challenge = otp::Entity::find().one(&h.db).await.unwrap().unwrap();

        let late = h
            .auth
            .verify_otp_at(
                verify("08031234567", &code),
                challenge.expires_at + Duration::milliseconds(1),
            )
            .await;
        assert!(matches!(late, Err(AppError::InvalidOrExpiredOtp)));
        assert_eq!(wallets::Entity::find().count(&h.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_malformed_phone_on_verify_is_invalid_otp() {
        let h = harness().await;
        let result = h.auth.verify_otp(verify("12345", "123456")).await;
        assert!(matches!(result, Err(AppError::InvalidOrExpiredOtp)));
    }

    #[tokio::test]
    async fn test_messaging_failure_surfaces_and_skips_placeholder() {
        let h = harness_with(RecordingSms::failing()).await;

        let result = h.auth.request_otp(request("08031234567")).await;
        assert!(matches!(result, Err(AppError::MessagingFailure(_))));

        let stored = otp::Entity::find().one(&h.db).await.unwrap().unwrap();
        assert!(stored.invalidated);
        assert_eq!(users::Entity::find().count(&h.db).await.unwrap(), 0);
        let verify_result = h
            .auth
            .verify_otp(verify("08031234567", &stored.code))
            .await;
        assert!(matches!(verify_result, Err(AppError::InvalidOrExpiredOtp)));
    }

    #[tokio::test]
    async fn test_concurrent_verifications_succeed_once() {
        let h = harness().await;
        h.auth.request_otp(request("08031234567")).await.unwrap();
        let code = h.sms.last_code().unwrap();

        let attempts = (0..8).map(|_| h.auth.verify_otp(verify("08031234567", &code)));
        let results = join_all(attempts).await;

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(
            results
                .iter()
                .filter(|r| r.is_err())
                .all(|r| matches!(r, Err(AppError::InvalidOrExpiredOtp)))
        );

        let consumed = otp::Entity::find()
            .filter(otp::Column::Consumed.eq(true))
            .count(&h.db)
            .await
            .unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(wallets::Entity::find().count(&h.db).await.unwrap(), 1);
    }
}
