use crate::schemas::arguments::{PageArgs, RoleArgs};
use crate::schemas::schema::{
    MemberCardRecord, OrderRecord, OrderStatus, PaymentOutcome, PermissionGrant,
    PermissionRecord, RoleRecord, SeedSummary, ServiceAccess, UserRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use genius_error::SqlError;
use genius_settings::config::DatabaseSettings;
use std::fmt;

pub enum GeniusTable {
    Users,
    Roles,
    Permissions,
    UserRole,
    RolePermission,
    MemberCards,
    Orders,
}

impl fmt::Display for GeniusTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table_name = match self {
            GeniusTable::Users => "users",
            GeniusTable::Roles => "roles",
            GeniusTable::Permissions => "permissions",
            GeniusTable::UserRole => "user_role",
            GeniusTable::RolePermission => "role_permission",
            GeniusTable::MemberCards => "member_cards",
            GeniusTable::Orders => "orders",
        };
        write!(f, "{}", table_name)
    }
}

/// Map a sqlx error onto the crate error, surfacing unique violations as conflicts
pub fn map_sqlx_error(e: sqlx::Error) -> SqlError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            SqlError::Conflict(db.message().to_string())
        }
        sqlx::Error::RowNotFound => SqlError::NotFound(format!("{}", e)),
        _ => SqlError::QueryError(format!("{}", e)),
    }
}

pub fn map_tx_error(e: sqlx::Error) -> SqlError {
    SqlError::TransactionError(format!("{}", e))
}

#[async_trait]
pub trait SqlClient: Sized + Send + Sync {
    async fn new(settings: &DatabaseSettings) -> Result<Self, SqlError>;
    async fn run_migrations(&self) -> Result<(), SqlError>;

    /// Seed default permissions, roles and member cards into empty tables.
    /// Tables that already hold rows are left untouched.
    async fn seed_defaults(&self) -> Result<SeedSummary, SqlError>;

    // users

    /// Insert a user and, when `role_name` names an existing role, link it in the same transaction
    async fn create_user(&self, user: &UserRecord, role_name: Option<&str>)
        -> Result<(), SqlError>;
    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, SqlError>;
    async fn get_user_by_username(&self, username: &str)
        -> Result<Option<UserRecord>, SqlError>;
    async fn update_user(&self, user: &UserRecord) -> Result<bool, SqlError>;
    async fn delete_user(&self, id: &str) -> Result<bool, SqlError>;
    async fn list_users(&self, page: &PageArgs) -> Result<(Vec<UserRecord>, i64), SqlError>;
    async fn add_roles_to_user(&self, user_id: &str, role_ids: &[i64]) -> Result<(), SqlError>;
    async fn get_user_roles(&self, user_id: &str) -> Result<Vec<RoleRecord>, SqlError>;
    async fn remove_role_from_user(&self, user_id: &str, role_id: i64) -> Result<bool, SqlError>;
    async fn get_permission_grants(&self, user_id: &str)
        -> Result<Vec<PermissionGrant>, SqlError>;

    /// Atomically count one free use for `today`.
    ///
    /// A count stamped with an earlier date restarts at one. Returns the
    /// count after the increment, or `None` when the user has reached
    /// `daily_limit` (or does not exist).
    async fn consume_daily_use(
        &self,
        user_id: &str,
        today: NaiveDate,
        daily_limit: i32,
    ) -> Result<Option<i32>, SqlError>;

    // roles
    async fn create_role(&self, args: &RoleArgs) -> Result<RoleRecord, SqlError>;
    async fn get_role(&self, id: i64) -> Result<Option<RoleRecord>, SqlError>;
    async fn get_role_by_name(&self, role_name: &str) -> Result<Option<RoleRecord>, SqlError>;
    async fn list_roles(&self, page: &PageArgs) -> Result<(Vec<RoleRecord>, i64), SqlError>;
    async fn update_role(&self, id: i64, args: &RoleArgs) -> Result<bool, SqlError>;
    async fn delete_role(&self, id: i64) -> Result<bool, SqlError>;
    async fn add_permissions_to_role(
        &self,
        role_id: i64,
        permission_ids: &[String],
    ) -> Result<(), SqlError>;
    async fn get_role_permissions(&self, role_id: i64)
        -> Result<Vec<PermissionRecord>, SqlError>;
    async fn remove_permission_from_role(
        &self,
        role_id: i64,
        permission_id: &str,
    ) -> Result<bool, SqlError>;

    // permissions
    async fn create_permission(&self, permission: &PermissionRecord) -> Result<(), SqlError>;
    async fn get_permission(&self, id: &str) -> Result<Option<PermissionRecord>, SqlError>;
    async fn list_permissions(&self) -> Result<Vec<PermissionRecord>, SqlError>;
    async fn update_permission(&self, permission: &PermissionRecord) -> Result<bool, SqlError>;
    async fn delete_permission(&self, id: &str) -> Result<bool, SqlError>;

    // member cards and orders
    async fn list_member_cards(&self) -> Result<Vec<MemberCardRecord>, SqlError>;
    async fn get_member_card(&self, id: i64) -> Result<Option<MemberCardRecord>, SqlError>;
    async fn create_order(&self, order: &OrderRecord) -> Result<(), SqlError>;
    async fn get_order(&self, id: &str) -> Result<Option<OrderRecord>, SqlError>;
    async fn list_user_orders(&self, user_id: &str) -> Result<Vec<OrderRecord>, SqlError>;

    /// Settle an order and extend the owner's membership in one transaction.
    ///
    /// Only orders in `created` move to `paid`. Settling an order that is
    /// already paid returns [`PaymentOutcome::AlreadyPaid`] and changes nothing.
    async fn pay_order(&self, id: &str, now: DateTime<Utc>) -> Result<PaymentOutcome, SqlError>;

    /// Move a `created` order to `cancelled` or `failed`. Returns false when
    /// the order is missing or no longer `created`.
    async fn close_order(&self, id: &str, status: OrderStatus) -> Result<bool, SqlError>;

    /// Check and record one use of the paid service.
    ///
    /// Members are always allowed and are not counted. Everyone else spends
    /// one of their daily free uses.
    async fn use_service(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        daily_limit: i32,
    ) -> Result<ServiceAccess, SqlError> {
        let user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| SqlError::NotFound(format!("user {}", user_id)))?;

        if let Some(expiry) = user.member_expiry.filter(|expiry| *expiry > now) {
            return Ok(ServiceAccess::Member { expiry });
        }

        match self
            .consume_daily_use(user_id, now.date_naive(), daily_limit)
            .await?
        {
            Some(used) => Ok(ServiceAccess::Granted {
                remaining: (daily_limit - used).max(0),
            }),
            None => Ok(ServiceAccess::Denied),
        }
    }
}
