use chrono::{DateTime, Duration, NaiveDate, Utc};
use genius_error::SqlError;
use genius_utils::utils::{get_utc_datetime, new_uid};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub member_expiry: Option<DateTime<Utc>>,
    pub last_use_date: Option<NaiveDate>,
    pub daily_use_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(username: String, password_hash: String, email: String) -> Self {
        let now = get_utc_datetime();
        UserRecord {
            id: new_uid(),
            username,
            password_hash,
            email,
            member_expiry: None,
            last_use_date: None,
            daily_use_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// A user is a member while their expiry lies strictly in the future
    pub fn is_member(&self, now: DateTime<Utc>) -> bool {
        matches!(self.member_expiry, Some(expiry) if expiry > now)
    }

    /// Daily use count as seen on `today`. A count recorded on an earlier day
    /// has expired and reads as zero.
    pub fn effective_daily_count(&self, today: NaiveDate) -> i32 {
        match self.last_use_date {
            Some(last_use) if last_use >= today => self.daily_use_count,
            _ => 0,
        }
    }

    /// Read-only evaluation of whether the user may use the service right now
    pub fn service_access(&self, now: DateTime<Utc>, daily_limit: i32) -> ServiceAccess {
        if let Some(expiry) = self.member_expiry.filter(|expiry| *expiry > now) {
            return ServiceAccess::Member { expiry };
        }

        let used = self.effective_daily_count(now.date_naive());
        if used < daily_limit {
            ServiceAccess::Granted {
                remaining: daily_limit - used,
            }
        } else {
            ServiceAccess::Denied
        }
    }
}

/// Outcome of a service access check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceAccess {
    /// Active member, use is not counted
    Member { expiry: DateTime<Utc> },
    /// Free use granted, `remaining` uses are left today
    Granted { remaining: i32 },
    /// Daily free uses exhausted
    Denied,
}

impl ServiceAccess {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, ServiceAccess::Denied)
    }
}

/// Compute the membership expiry after buying `duration_days` more days.
///
/// Active memberships stack on top of the current expiry, lapsed or missing
/// memberships start from `now`.
pub fn extend_membership(
    current_expiry: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    duration_days: i32,
) -> DateTime<Utc> {
    let base = match current_expiry {
        Some(expiry) if expiry > now => expiry,
        _ => now,
    };
    base + Duration::days(i64::from(duration_days))
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleRecord {
    pub id: i64,
    pub role_name: String,
    pub name: String,
    pub description: String,
    pub is_super: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PermissionRecord {
    pub id: String,
    pub method: String,
    pub path_pattern: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl PermissionRecord {
    pub fn new(method: &str, path_pattern: &str, description: &str) -> Self {
        PermissionRecord {
            id: new_uid(),
            method: method.trim().to_uppercase(),
            path_pattern: path_pattern.trim().to_string(),
            description: description.to_string(),
            created_at: get_utc_datetime(),
        }
    }
}

/// One row of the user -> role -> permission join.
///
/// `method` and `path_pattern` are `None` for roles without any permission
/// rows; such a row still carries the role's super flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PermissionGrant {
    pub is_super: bool,
    pub method: Option<String>,
    pub path_pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MemberCardRecord {
    pub id: i64,
    pub name: String,
    pub duration_days: i32,
    pub price: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Paid,
    Cancelled,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Created)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "created" => Ok(OrderStatus::Created),
            "paid" => Ok(OrderStatus::Paid),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "failed" => Ok(OrderStatus::Failed),
            _ => Err(SqlError::InvalidRecord(format!(
                "Unknown order status: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderRecord {
    pub id: String,
    pub user_id: String,
    pub card_id: i64,
    pub amount: i64,
    pub status: String,
    pub purchase_time: DateTime<Utc>,
    pub payment_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
    pub fn new(user_id: String, card_id: i64, amount: i64) -> Self {
        let now = get_utc_datetime();
        OrderRecord {
            id: new_uid(),
            user_id,
            card_id,
            amount,
            status: OrderStatus::Created.to_string(),
            purchase_time: now,
            payment_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> Result<OrderStatus, SqlError> {
        OrderStatus::from_str(&self.status)
    }
}

/// Result of settling an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Paid { member_expiry: DateTime<Utc> },
    AlreadyPaid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub permissions: usize,
    pub roles: usize,
    pub member_cards: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user() -> UserRecord {
        UserRecord::new(
            "alice".to_string(),
            "hash".to_string(),
            "alice@example.com".to_string(),
        )
    }

    fn noon(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_is_member() {
        let now = noon(10);
        let mut user = user();
        assert!(!user.is_member(now));

        user.member_expiry = Some(now + Duration::hours(1));
        assert!(user.is_member(now));

        // expiry is exclusive
        user.member_expiry = Some(now);
        assert!(!user.is_member(now));
    }

    #[test]
    fn test_effective_daily_count_resets_on_new_day() {
        let mut user = user();
        user.last_use_date = Some(noon(10).date_naive());
        user.daily_use_count = 1;

        assert_eq!(user.effective_daily_count(noon(10).date_naive()), 1);
        assert_eq!(user.effective_daily_count(noon(11).date_naive()), 0);
    }

    #[test]
    fn test_service_access() {
        let mut user = user();
        assert_eq!(
            user.service_access(noon(10), 1),
            ServiceAccess::Granted { remaining: 1 }
        );

        user.last_use_date = Some(noon(10).date_naive());
        user.daily_use_count = 1;
        assert_eq!(user.service_access(noon(10), 1), ServiceAccess::Denied);
        assert!(!user.service_access(noon(10), 1).is_allowed());

        // the next day the count is lazily reset
        assert_eq!(
            user.service_access(noon(11), 1),
            ServiceAccess::Granted { remaining: 1 }
        );

        let expiry = noon(20);
        user.member_expiry = Some(expiry);
        assert_eq!(
            user.service_access(noon(10), 1),
            ServiceAccess::Member { expiry }
        );
    }

    #[test]
    fn test_extend_membership_from_now() {
        let now = noon(10);
        assert_eq!(extend_membership(None, now, 7), now + Duration::days(7));

        // lapsed membership starts over from now
        let lapsed = now - Duration::days(2);
        assert_eq!(
            extend_membership(Some(lapsed), now, 7),
            now + Duration::days(7)
        );
    }

    #[test]
    fn test_extend_membership_stacks() {
        let now = noon(10);
        let current = now + Duration::days(3);
        let extended = extend_membership(Some(current), now, 7);
        assert_eq!(extended, current + Duration::days(7));
        assert_eq!(extended, now + Duration::days(10));
    }

    #[test]
    fn test_order_status() {
        assert_eq!("paid".parse::<OrderStatus>().unwrap(), OrderStatus::Paid);
        assert_eq!(
            "Cancelled".parse::<OrderStatus>().unwrap(),
            OrderStatus::Cancelled
        );
        assert!("refunded".parse::<OrderStatus>().is_err());
        assert!(!OrderStatus::Created.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());

        let order = OrderRecord::new("user".to_string(), 1, 998);
        assert_eq!(order.status().unwrap(), OrderStatus::Created);
        assert!(order.payment_time.is_none());
    }

    #[test]
    fn test_permission_record_normalizes_method() {
        let permission = PermissionRecord::new(" get ", " /api/v1/users/* ", "read users");
        assert_eq!(permission.method, "GET");
        assert_eq!(permission.path_pattern, "/api/v1/users/*");
    }
}
