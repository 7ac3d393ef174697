use crate::entities::{LinkedBankAccount, wallet_entity as wallets};
use crate::error::{AppError, AppResult};
use crate::external::BankAccountResolver;
use crate::models::{VerifyBankRequest, VerifyBankResponse};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct BankService {
    pool: DatabaseConnection,
    resolver: Arc<dyn BankAccountResolver>,
}

impl BankService {
    pub fn new(pool: DatabaseConnection, resolver: Arc<dyn BankAccountResolver>) -> Self {
        Self { pool, resolver }
    }

    /// 校验银行账户并绑定到用户钱包
    pub async fn verify_bank_account(
        &self,
        user_id: i32,
        request: VerifyBankRequest,
    ) -> AppResult<VerifyBankResponse> {
        let account_number = request.account_number.trim();
        let bank_code = request.bank_code.trim();
        validate_bank_details(account_number, bank_code)?;

        // 先确认钱包存在，避免无谓的外部调用
        let wallet_exists = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .is_some();
        if !wallet_exists {
            return Err(AppError::NotFound("Wallet not found".to_string()));
        }

        let resolved = self
            .resolver
            .resolve_account(account_number, bank_code)
            .await?
            .ok_or(AppError::BankAccountUnresolved)?;

        let linked = LinkedBankAccount {
            account_number: account_number.to_string(),
            bank_code: bank_code.to_string(),
            account_name: resolved.account_name.clone(),
        };

        // 行锁保证并发绑定时读改写不丢失更新
        let txn = self.pool.begin().await?;
        let wallet = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Wallet not found".to_string()))?;

        let accounts = with_primary_account(wallet.linked_accounts(), linked);
        let mut am = wallet.into_active_model();
        am.linked_bank_accounts = Set(serde_json::to_value(&accounts)?);
        am.bank_verified = Set(true);
        am.updated_at = Set(Utc::now());
        let wallet = am.update(&txn).await?;
        txn.commit().await?;

        log::info!("Bank account linked to wallet {} for user {}", wallet.id, user_id);

        Ok(VerifyBankResponse {
            account_name: resolved.account_name,
        })
    }
}

fn validate_bank_details(account_number: &str, bank_code: &str) -> AppResult<()> {
    // NUBAN 账号固定 10 位
    if account_number.len() != 10 || !account_number.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::ValidationError(
            "account_number must be 10 digits".to_string(),
        ));
    }
    if bank_code.is_empty()
        || bank_code.len() > 10
        || !bank_code.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(AppError::ValidationError("Invalid bank_code".to_string()));
    }
    Ok(())
}

/// 新校验的账户放在首位，同一账户的旧记录被替换
fn with_primary_account(
    existing: Vec<LinkedBankAccount>,
    primary: LinkedBankAccount,
) -> Vec<LinkedBankAccount> {
    let others = existing.into_iter().filter(|a| {
        a.account_number != primary.account_number || a.bank_code != primary.bank_code
    });
    let mut accounts: Vec<LinkedBankAccount> = others.collect();
    accounts.insert(0, primary);
    accounts
}
