use crate::entities::{UserRole, user_entity as users, wallet_entity as wallets};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RequestOtpRequest {
    #[schema(example = "08031234567")]
    pub phone: String,
    #[schema(example = "Ada Obi")]
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RequestOtpResponse {
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    #[schema(example = "08031234567")]
    pub phone: String,
    #[schema(example = "123456")]
    pub otp: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub phone: String,
    pub full_name: String,
    pub role: UserRole,
    pub wallet_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// 用户与钱包的联合视图；尚未开户时钱包字段为空
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i32,
    pub phone: String,
    pub full_name: String,
    pub role: UserRole,
    pub rating: f64,
    pub phone_verified: bool,
    #[schema(value_type = Option<String>, example = "0.00")]
    pub balance: Option<Decimal>,
    pub bank_verified: Option<bool>,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            phone: user.phone,
            full_name: user.full_name,
            role: user.role,
            wallet_id: user.wallet_id,
        }
    }
}

impl From<(users::Model, Option<wallets::Model>)> for ProfileResponse {
    fn from((user, wallet): (users::Model, Option<wallets::Model>)) -> Self {
        Self {
            id: user.id,
            phone: user.phone,
            full_name: user.full_name,
            role: user.role,
            rating: user.rating,
            phone_verified: user.phone_verified,
            balance: wallet.as_ref().map(wallets::Model::balance),
            bank_verified: wallet.as_ref().map(|w| w.bank_verified),
        }
    }
}
