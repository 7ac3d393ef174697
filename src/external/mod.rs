pub mod paystack;
pub mod sms;
pub mod twilio;

pub use paystack::*;
pub use sms::*;
pub use twilio::*;
