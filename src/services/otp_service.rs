use crate::entities::otp_challenge_entity as otp;
use crate::error::{AppError, AppResult};
use crate::external::SmsGateway;
use crate::utils::{PhoneNumber, generate_six_digit_code, mask_phone};
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct OtpService {
    pool: DatabaseConnection,
    sms: Arc<dyn SmsGateway>,
    ttl: Duration,
}

impl OtpService {
    pub fn new(pool: DatabaseConnection, sms: Arc<dyn SmsGateway>, ttl_secs: i64) -> Self {
        Self {
            pool,
            sms,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// 生成验证码 -> 落库 -> 发送短信
    ///
    /// 短信发送失败时该条验证码被作废 (invalidated)，整个请求返回 MessagingFailure，
    /// 用户需要重新请求。
    pub async fn issue(&self, phone: &PhoneNumber) -> AppResult<otp::Model> {
        let code = generate_six_digit_code();
        let challenge = self.store(phone, &code, Utc::now()).await?;

        let message = format!(
            "Your LetsGo OTP is {code}. Valid for {} mins.",
            self.ttl.num_minutes()
        );

        if let Err(e) = self.sms.send(phone.as_str(), &message).await {
            log::warn!(
                "OTP {} for {} was not delivered, invalidating it",
                challenge.id,
                mask_phone(phone.as_str())
            );
            if let Err(db_err) = self.invalidate(challenge.id).await {
                log::error!("Failed to invalidate undelivered OTP {}: {db_err}", challenge.id);
            }
            return Err(match e {
                AppError::MessagingFailure(_) => e,
                other => AppError::MessagingFailure(other.to_string()),
            });
        }

        log::info!(
            "OTP {} issued for {}, expires at {}",
            challenge.id,
            mask_phone(phone.as_str()),
            challenge.expires_at
        );
        Ok(challenge)
    }

    /// 消费验证码：找到该手机号最新一条未使用、未作废、未过期且代码完全一致的记录，
    /// 再经 mark_consumed 原子地置为已使用。
    pub async fn consume<C: ConnectionTrait>(
        &self,
        conn: &C,
        phone: &PhoneNumber,
        code: &str,
        now: DateTime<Utc>,
    ) -> AppResult<otp::Model> {
        let candidate = otp::Entity::find()
            .filter(otp::Column::Phone.eq(phone.as_str()))
            .filter(otp::Column::Code.eq(code))
            .filter(otp::Column::Consumed.eq(false))
            .filter(otp::Column::Invalidated.eq(false))
            .filter(otp::Column::ExpiresAt.gt(now))
            .order_by_desc(otp::Column::IssuedAt)
            .order_by_desc(otp::Column::Id)
            .one(conn)
            .await?
            .filter(|c| c.is_usable_at(now))
            .ok_or(AppError::InvalidOrExpiredOtp)?;

        self.mark_consumed(conn, candidate.id, now).await?;

        Ok(otp::Model {
            consumed: true,
            consumed_at: Some(now),
            ..candidate
        })
    }

    /// 以 consumed = false 为条件的单行更新；未命中恰好一行说明已被其他请求消费
    async fn mark_consumed<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = otp::Entity::update_many()
            .col_expr(otp::Column::Consumed, Expr::value(true))
            .col_expr(otp::Column::ConsumedAt, Expr::value(now))
            .filter(otp::Column::Id.eq(id))
            .filter(otp::Column::Consumed.eq(false))
            .exec(conn)
            .await?;

        if result.rows_affected != 1 {
            log::warn!("OTP {id} was consumed concurrently");
            return Err(AppError::InvalidOrExpiredOtp);
        }
        Ok(())
    }

    pub(crate) async fn store(
        &self,
        phone: &PhoneNumber,
        code: &str,
        issued_at: DateTime<Utc>,
    ) -> AppResult<otp::Model> {
        let model = otp::ActiveModel {
            phone: Set(phone.as_str().to_string()),
            code: Set(code.to_string()),
            issued_at: Set(issued_at),
            expires_at: Set(issued_at + self.ttl),
            consumed: Set(false),
            consumed_at: Set(None),
            invalidated: Set(false),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(model)
    }

    async fn invalidate(&self, id: i32) -> AppResult<()> {
        otp::Entity::update_many()
            .col_expr(otp::Column::Invalidated, Expr::value(true))
            .filter(otp::Column::Id.eq(id))
            .exec(&self.pool)
            .await?;
        Ok(())
    }
}
