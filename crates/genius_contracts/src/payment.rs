use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaymentRequest {
    #[validate(range(min = 1, message = "card_id must be positive"))]
    pub card_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub order_id: String,
    pub pay_url: String,
}
