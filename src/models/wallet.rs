use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyBankRequest {
    #[schema(example = "0001234567")]
    pub account_number: String,
    #[schema(example = "058")]
    pub bank_code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyBankResponse {
    pub account_name: String,
}
