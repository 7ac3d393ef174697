pub mod otp_challenges;
pub mod users;
pub mod wallets;

pub use otp_challenges as otp_challenge_entity;
pub use users as user_entity;
pub use wallets as wallet_entity;

pub use users::UserRole;
pub use wallets::LinkedBankAccount;
