use chrono::{DateTime, Utc};
use genius_sql::schemas::schema::{MemberCardRecord, OrderRecord, ServiceAccess};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberCardInfo {
    pub id: i64,
    pub name: String,
    pub duration_days: i32,
    /// fen
    pub price: i64,
    pub description: String,
}

impl From<&MemberCardRecord> for MemberCardInfo {
    fn from(card: &MemberCardRecord) -> Self {
        MemberCardInfo {
            id: card.id,
            name: card.name.clone(),
            duration_days: card.duration_days,
            price: card.price,
            description: card.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberCardList {
    pub cards: Vec<MemberCardInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberInfoResponse {
    pub is_member: bool,
    pub expiry_time: Option<DateTime<Utc>>,
    pub daily_free_uses: i32,
    /// `None` for members, who are not limited
    pub remaining_today: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCheckResponse {
    pub allowed: bool,
    pub is_member: bool,
    pub remaining_today: Option<i32>,
}

impl From<ServiceAccess> for ServiceCheckResponse {
    fn from(access: ServiceAccess) -> Self {
        match access {
            ServiceAccess::Member { .. } => ServiceCheckResponse {
                allowed: true,
                is_member: true,
                remaining_today: None,
            },
            ServiceAccess::Granted { remaining } => ServiceCheckResponse {
                allowed: true,
                is_member: false,
                remaining_today: Some(remaining),
            },
            ServiceAccess::Denied => ServiceCheckResponse {
                allowed: false,
                is_member: false,
                remaining_today: Some(0),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(range(min = 1, message = "card_id must be positive"))]
    pub card_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub card_id: i64,
    /// fen
    pub amount: i64,
    pub status: String,
    pub purchase_time: DateTime<Utc>,
    pub payment_time: Option<DateTime<Utc>>,
}

impl From<&OrderRecord> for OrderResponse {
    fn from(order: &OrderRecord) -> Self {
        OrderResponse {
            id: order.id.clone(),
            card_id: order.card_id,
            amount: order.amount,
            status: order.status.clone(),
            purchase_time: order.purchase_time,
            payment_time: order.payment_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderList {
    pub orders: Vec<OrderResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayOrderResponse {
    pub order_id: String,
    pub already_paid: bool,
    pub member_expiry: Option<DateTime<Utc>>,
}
