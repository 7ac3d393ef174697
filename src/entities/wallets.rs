use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 已通过 Paystack 校验的银行账户，存放在 linked_bank_accounts JSON 数组中
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LinkedBankAccount {
    pub account_number: String,
    pub bank_code: String,
    pub account_name: String,
}

/// 钱包，与用户一对一 (user_id 唯一)。余额以 kobo 存储。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub balance_kobo: i64,
    pub bank_verified: bool,
    pub linked_bank_accounts: Json,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// 以奈拉计的余额，保留两位小数
    pub fn balance(&self) -> Decimal {
        Decimal::new(self.balance_kobo, 2)
    }

    pub fn linked_accounts(&self) -> Vec<LinkedBankAccount> {
        serde_json::from_value(self.linked_bank_accounts.clone()).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
