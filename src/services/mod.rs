pub mod account_service;
pub mod auth_service;
pub mod bank_service;
pub mod otp_service;

pub use account_service::*;
pub use auth_service::*;
pub use bank_service::*;
pub use otp_service::*;
