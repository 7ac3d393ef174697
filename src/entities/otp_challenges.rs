use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 验证码记录
/// 状态:
/// - issued: consumed = false 且 invalidated = false 且未过期
/// - consumed: 验证成功后置为 true，只会发生一次
/// - invalidated: 短信发送失败，该验证码作废
/// - expired: 不落库，读取时按 expires_at 判断
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "otp_challenges")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub phone: String,
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
    pub consumed_at: Option<DateTime<Utc>>,
    pub invalidated: bool,
}

impl Model {
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.consumed && !self.invalidated && self.expires_at > now
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
