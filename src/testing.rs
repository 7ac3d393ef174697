//! 测试辅助：内存 SQLite + 可控的短信/银行桩
use crate::error::{AppError, AppResult};
use crate::external::{BankAccountResolver, ResolvedAccount, SmsGateway};
use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// 单连接的内存库，保证所有查询看到同一份数据
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

#[derive(Default)]
pub struct RecordingSms {
    sent: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

impl RecordingSms {
    pub fn failing() -> Self {
        let sms = Self::default();
        sms.fail.store(true, Ordering::SeqCst);
        sms
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_recipient(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(to, _)| to.clone())
    }

    /// 从最近一条短信中取出6位验证码
    pub fn last_code(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let (_, body) = sent.last()?;
        body.split(|c: char| !c.is_ascii_digit())
            .find(|part| part.len() == 6)
            .map(str::to_string)
    }
}

#[async_trait]
impl SmsGateway for RecordingSms {
    async fn send(&self, phone: &str, message: &str) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::MessagingFailure("gateway unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), message.to_string()));
        Ok(())
    }
}

pub enum StubResolver {
    Resolves(&'static str),
    Unresolved,
    Down,
}

#[async_trait]
impl BankAccountResolver for StubResolver {
    async fn resolve_account(
        &self,
        account_number: &str,
        _bank_code: &str,
    ) -> AppResult<Option<ResolvedAccount>> {
        match self {
            StubResolver::Resolves(name) => Ok(Some(ResolvedAccount {
                account_number: account_number.to_string(),
                account_name: name.to_string(),
            })),
            StubResolver::Unresolved => Ok(None),
            StubResolver::Down => Err(AppError::UpstreamFailure("timeout".to_string())),
        }
    }
}
