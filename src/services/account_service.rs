use crate::entities::{UserRole, user_entity as users, wallet_entity as wallets};
use crate::error::{AppError, AppResult};
use crate::models::ProfileResponse;
use crate::utils::{PhoneNumber, mask_phone};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set,
};

pub const DEFAULT_FULL_NAME: &str = "LetsGo User";
const MAX_FULL_NAME_LEN: usize = 100;

/// 规范化显示名：去掉首尾空白，空值使用默认名
pub fn normalize_full_name(full_name: Option<&str>) -> AppResult<String> {
    let name = full_name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Ok(DEFAULT_FULL_NAME.to_string());
    }
    if name.chars().count() > MAX_FULL_NAME_LEN {
        return Err(AppError::ValidationError(format!(
            "full_name must be at most {MAX_FULL_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

#[derive(Clone)]
pub struct AccountService {
    pool: DatabaseConnection,
}

impl AccountService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 按手机号 find-or-create 占位账户 (phone_verified = false)。
    /// 依赖 users.phone 唯一索引：插入冲突时什么也不做，再读回已有记录。
    pub async fn ensure_placeholder<C: ConnectionTrait>(
        &self,
        conn: &C,
        phone: &PhoneNumber,
        full_name: &str,
    ) -> AppResult<users::Model> {
        let now = Utc::now();
        let inserted = users::Entity::insert(users::ActiveModel {
            phone: Set(phone.as_str().to_string()),
            full_name: Set(full_name.to_string()),
            role: Set(UserRole::User),
            phone_verified: Set(false),
            wallet_id: Set(None),
            rating: Set(5.0),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(users::Column::Phone)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

        if inserted > 0 {
            log::info!(
                "Created placeholder account for {}",
                mask_phone(phone.as_str())
            );
        }

        users::Entity::find()
            .filter(users::Column::Phone.eq(phone.as_str()))
            .one(conn)
            .await?
            .ok_or_else(|| {
                AppError::InternalError("Account vanished after find-or-create".to_string())
            })
    }

    /// 验证成功后的开户步骤，保证每个用户只有一个钱包。
    ///
    /// - 已绑定钱包：只更新 phone_verified 与 last_login
    /// - 未绑定：插入钱包 (user_id 冲突则忽略，说明并发请求已创建)，
    ///   读回钱包后写入 users.wallet_id
    ///
    /// 调用方负责把它与验证码消费放在同一个事务中。
    pub async fn provision_wallet<C: ConnectionTrait>(
        &self,
        conn: &C,
        user: users::Model,
        now: DateTime<Utc>,
    ) -> AppResult<(users::Model, wallets::Model)> {
        let wallet = match user.wallet_id {
            Some(wallet_id) => wallets::Entity::find_by_id(wallet_id)
                .one(conn)
                .await?
                .ok_or_else(|| {
                    AppError::InternalError(format!(
                        "User {} references missing wallet {wallet_id}",
                        user.id
                    ))
                })?,
            None => self.create_wallet_once(conn, user.id, now).await?,
        };

        let mut am = user.into_active_model();
        am.wallet_id = Set(Some(wallet.id));
        am.phone_verified = Set(true);
        am.last_login = Set(Some(now));
        am.updated_at = Set(now);
        let user = am.update(conn).await?;

        Ok((user, wallet))
    }

    /// 独立事务版本，测试中直接为已有用户开户
    #[cfg(test)]
    pub(crate) async fn provision_wallet_for(
        &self,
        user_id: i32,
    ) -> AppResult<(users::Model, wallets::Model)> {
        use sea_orm::TransactionTrait;

        let txn = self.pool.begin().await?;
        let user = users::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let provisioned = self.provision_wallet(&txn, user, Utc::now()).await?;
        txn.commit().await?;
        Ok(provisioned)
    }

    /// 用户与钱包联合视图
    pub async fn get_profile(&self, user_id: i32) -> AppResult<ProfileResponse> {
        let (user, wallet) = users::Entity::find_by_id(user_id)
            .find_also_related(wallets::Entity)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(ProfileResponse::from((user, wallet)))
    }

    async fn create_wallet_once<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<wallets::Model> {
        let inserted = wallets::Entity::insert(wallets::ActiveModel {
            user_id: Set(user_id),
            balance_kobo: Set(0),
            bank_verified: Set(false),
            linked_bank_accounts: Set(serde_json::json!([])),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(wallets::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

        let wallet = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .one(conn)
            .await?
            .ok_or_else(|| {
                AppError::InternalError(format!("Wallet for user {user_id} not found after insert"))
            })?;

        if inserted > 0 {
            log::info!("Created wallet {} for user {}", wallet.id, user_id);
        } else {
            log::info!(
                "Wallet {} already existed for user {}, reusing it",
                wallet.id,
                user_id
            );
        }
        Ok(wallet)
    }
}
