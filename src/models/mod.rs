pub mod common;
pub mod user;
pub mod wallet;

pub use common::*;
pub use user::*;
pub use wallet::*;
