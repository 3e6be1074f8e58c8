use crate::base::{map_sqlx_error, map_tx_error, GeniusTable, SqlClient};
use crate::schemas::arguments::{PageArgs, RoleArgs};
use crate::schemas::schema::{
    extend_membership, MemberCardRecord, OrderRecord, OrderStatus, PaymentOutcome,
    PermissionGrant, PermissionRecord, RoleRecord, SeedSummary, UserRecord,
};
use crate::postgres::helper::PostgresQueryHelper;
use crate::seed::{DEFAULT_MEMBER_CARDS, DEFAULT_PERMISSIONS, DEFAULT_ROLES};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use genius_error::SqlError;
use genius_settings::config::DatabaseSettings;
use genius_utils::utils::get_utc_datetime;
use sqlx::{
    postgres::{PgPoolOptions, Postgres},
    Pool,
};
use tracing::{debug, info};

pub struct PostgresClient {
    pub pool: Pool<Postgres>,
}

impl PostgresClient {
    async fn count_rows(&self, table: GeniusTable) -> Result<i64, SqlError> {
        let query = format!("SELECT COUNT(*) FROM {}", table);
        sqlx::query_scalar::<_, i64>(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl SqlClient for PostgresClient {
    async fn new(settings: &DatabaseSettings) -> Result<Self, SqlError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect(&settings.connection_uri)
            .await
            .map_err(|e| SqlError::ConnectionError(format!("{}", e)))?;

        let client = Self { pool };

        // run migrations
        client.run_migrations().await?;

        Ok(client)
    }

    async fn run_migrations(&self) -> Result<(), SqlError> {
        info!("Running migrations");
        sqlx::migrate!("src/postgres/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| SqlError::MigrationError(format!("{}", e)))?;

        Ok(())
    }

    async fn seed_defaults(&self) -> Result<SeedSummary, SqlError> {
        let mut summary = SeedSummary::default();
        let now = get_utc_datetime();

        if self.count_rows(GeniusTable::Permissions).await? == 0
            && self.count_rows(GeniusTable::Roles).await? == 0
        {
            let mut tx = self.pool.begin().await.map_err(map_tx_error)?;

            let role_query = PostgresQueryHelper::get_role_insert_query();
            let mut roles = Vec::with_capacity(DEFAULT_ROLES.len());
            for role in DEFAULT_ROLES.iter() {
                let role_id = sqlx::query_scalar::<_, i64>(&role_query)
                    .bind(role.role_name)
                    .bind(role.name)
                    .bind(role.description)
                    .bind(role.is_super)
                    .bind(now)
                    .bind(now)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;
                roles.push((role_id, role.is_super));
            }

            let permission_query = PostgresQueryHelper::get_permission_insert_query();
            for seed in DEFAULT_PERMISSIONS {
                let permission =
                    PermissionRecord::new(seed.method, seed.path_pattern, seed.description);
                sqlx::query(&permission_query)
                    .bind(&permission.id)
                    .bind(&permission.method)
                    .bind(&permission.path_pattern)
                    .bind(&permission.description)
                    .bind(permission.created_at)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;

                // admins hold everything, regular users only the self service routes
                for (role_id, is_super) in roles.iter() {
                    if *is_super || seed.self_service {
                        sqlx::query(
                            "INSERT INTO role_permission (role_id, permission_id) VALUES ($1, $2)",
                        )
                        .bind(role_id)
                        .bind(&permission.id)
                        .execute(&mut *tx)
                        .await
                        .map_err(map_sqlx_error)?;
                    }
                }
            }

            tx.commit().await.map_err(map_tx_error)?;
            summary.roles = DEFAULT_ROLES.len();
            summary.permissions = DEFAULT_PERMISSIONS.len();
        }

        if self.count_rows(GeniusTable::MemberCards).await? == 0 {
            let mut tx = self.pool.begin().await.map_err(map_tx_error)?;
            let card_query = PostgresQueryHelper::get_member_card_insert_query();

            for card in DEFAULT_MEMBER_CARDS.iter() {
                sqlx::query(&card_query)
                    .bind(card.name)
                    .bind(card.duration_days)
                    .bind(card.price)
                    .bind(card.description)
                    .bind(now)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;
            }

            tx.commit().await.map_err(map_tx_error)?;
            summary.member_cards = DEFAULT_MEMBER_CARDS.len();
        }

        Ok(summary)
    }

    async fn create_user(
        &self,
        user: &UserRecord,
        role_name: Option<&str>,
    ) -> Result<(), SqlError> {
        let mut tx = self.pool.begin().await.map_err(map_tx_error)?;

        let query = PostgresQueryHelper::get_user_insert_query();
        sqlx::query(&query)
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.email)
            .bind(user.member_expiry)
            .bind(user.last_use_date)
            .bind(user.daily_use_count)
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if let Some(role_name) = role_name {
            sqlx::query(
                "INSERT INTO user_role (user_id, role_id) SELECT $1, id FROM roles WHERE role_name = $2",
            )
            .bind(&user.id)
            .bind(role_name)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_tx_error)?;

        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, SqlError> {
        sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, SqlError> {
        sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn update_user(&self, user: &UserRecord) -> Result<bool, SqlError> {
        let result = sqlx::query(
            "UPDATE users SET username = $1, email = $2, password_hash = $3, updated_at = $4 WHERE id = $5",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(get_utc_datetime())
        .bind(&user.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, SqlError> {
        let mut tx = self.pool.begin().await.map_err(map_tx_error)?;

        sqlx::query("DELETE FROM user_role WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM orders WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        tx.commit().await.map_err(map_tx_error)?;

        Ok(deleted > 0)
    }

    async fn list_users(&self, page: &PageArgs) -> Result<(Vec<UserRecord>, i64), SqlError> {
        let total = self.count_rows(GeniusTable::Users).await?;

        let users = sqlx::query_as::<_, UserRecord>(
            "SELECT * FROM users ORDER BY created_at, id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok((users, total))
    }

    async fn add_roles_to_user(&self, user_id: &str, role_ids: &[i64]) -> Result<(), SqlError> {
        let mut tx = self.pool.begin().await.map_err(map_tx_error)?;

        let user_exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if user_exists == 0 {
            return Err(SqlError::NotFound(format!("user {}", user_id)));
        }

        for role_id in role_ids {
            let role_exists =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM roles WHERE id = $1")
                    .bind(role_id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;

            if role_exists == 0 {
                return Err(SqlError::NotFound(format!("role {}", role_id)));
            }

            sqlx::query(
                "INSERT INTO user_role (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(role_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_tx_error)?;

        Ok(())
    }

    async fn get_user_roles(&self, user_id: &str) -> Result<Vec<RoleRecord>, SqlError> {
        sqlx::query_as::<_, RoleRecord>(
            "SELECT r.* FROM roles r JOIN user_role ur ON ur.role_id = r.id WHERE ur.user_id = $1 ORDER BY r.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn remove_role_from_user(&self, user_id: &str, role_id: i64) -> Result<bool, SqlError> {
        let result = sqlx::query("DELETE FROM user_role WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_permission_grants(
        &self,
        user_id: &str,
    ) -> Result<Vec<PermissionGrant>, SqlError> {
        let query = PostgresQueryHelper::get_permission_grants_query();
        sqlx::query_as::<_, PermissionGrant>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn consume_daily_use(
        &self,
        user_id: &str,
        today: NaiveDate,
        daily_limit: i32,
    ) -> Result<Option<i32>, SqlError> {
        let query = PostgresQueryHelper::get_consume_daily_use_query();
        sqlx::query_scalar::<_, i32>(&query)
            .bind(today)
            .bind(get_utc_datetime())
            .bind(user_id)
            .bind(daily_limit)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn create_role(&self, args: &RoleArgs) -> Result<RoleRecord, SqlError> {
        let now = get_utc_datetime();
        let query = PostgresQueryHelper::get_role_insert_query();

        let id = sqlx::query_scalar::<_, i64>(&query)
            .bind(&args.role_name)
            .bind(&args.name)
            .bind(&args.description)
            .bind(args.is_super)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(RoleRecord {
            id,
            role_name: args.role_name.clone(),
            name: args.name.clone(),
            description: args.description.clone(),
            is_super: args.is_super,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_role(&self, id: i64) -> Result<Option<RoleRecord>, SqlError> {
        sqlx::query_as::<_, RoleRecord>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn get_role_by_name(&self, role_name: &str) -> Result<Option<RoleRecord>, SqlError> {
        sqlx::query_as::<_, RoleRecord>("SELECT * FROM roles WHERE role_name = $1")
            .bind(role_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_roles(&self, page: &PageArgs) -> Result<(Vec<RoleRecord>, i64), SqlError> {
        let total = self.count_rows(GeniusTable::Roles).await?;

        let roles = sqlx::query_as::<_, RoleRecord>(
            "SELECT * FROM roles ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok((roles, total))
    }

    async fn update_role(&self, id: i64, args: &RoleArgs) -> Result<bool, SqlError> {
        let result = sqlx::query(
            "UPDATE roles SET role_name = $1, name = $2, description = $3, is_super = $4, updated_at = $5 WHERE id = $6",
        )
        .bind(&args.role_name)
        .bind(&args.name)
        .bind(&args.description)
        .bind(args.is_super)
        .bind(get_utc_datetime())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_role(&self, id: i64) -> Result<bool, SqlError> {
        let mut tx = self.pool.begin().await.map_err(map_tx_error)?;

        // associations go first, both tables reference roles
        sqlx::query("DELETE FROM user_role WHERE role_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM role_permission WHERE role_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let deleted = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        tx.commit().await.map_err(map_tx_error)?;

        Ok(deleted > 0)
    }

    async fn add_permissions_to_role(
        &self,
        role_id: i64,
        permission_ids: &[String],
    ) -> Result<(), SqlError> {
        let mut tx = self.pool.begin().await.map_err(map_tx_error)?;

        let role_exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if role_exists == 0 {
            return Err(SqlError::NotFound(format!("role {}", role_id)));
        }

        for permission_id in permission_ids {
            let permission_exists =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM permissions WHERE id = $1")
                    .bind(permission_id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;

            if permission_exists == 0 {
                return Err(SqlError::NotFound(format!("permission {}", permission_id)));
            }

            sqlx::query(
                "INSERT INTO role_permission (role_id, permission_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(role_id)
            .bind(permission_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_tx_error)?;

        Ok(())
    }

    async fn get_role_permissions(
        &self,
        role_id: i64,
    ) -> Result<Vec<PermissionRecord>, SqlError> {
        sqlx::query_as::<_, PermissionRecord>(
            "SELECT p.* FROM permissions p JOIN role_permission rp ON rp.permission_id = p.id WHERE rp.role_id = $1 ORDER BY p.path_pattern, p.method",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn remove_permission_from_role(
        &self,
        role_id: i64,
        permission_id: &str,
    ) -> Result<bool, SqlError> {
        let result =
            sqlx::query("DELETE FROM role_permission WHERE role_id = $1 AND permission_id = $2")
                .bind(role_id)
                .bind(permission_id)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_permission(&self, permission: &PermissionRecord) -> Result<(), SqlError> {
        let query = PostgresQueryHelper::get_permission_insert_query();
        sqlx::query(&query)
            .bind(&permission.id)
            .bind(&permission.method)
            .bind(&permission.path_pattern)
            .bind(&permission.description)
            .bind(permission.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get_permission(&self, id: &str) -> Result<Option<PermissionRecord>, SqlError> {
        sqlx::query_as::<_, PermissionRecord>("SELECT * FROM permissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_permissions(&self) -> Result<Vec<PermissionRecord>, SqlError> {
        sqlx::query_as::<_, PermissionRecord>(
            "SELECT * FROM permissions ORDER BY path_pattern, method",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn update_permission(&self, permission: &PermissionRecord) -> Result<bool, SqlError> {
        let result = sqlx::query(
            "UPDATE permissions SET method = $1, path_pattern = $2, description = $3 WHERE id = $4",
        )
        .bind(&permission.method)
        .bind(&permission.path_pattern)
        .bind(&permission.description)
        .bind(&permission.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_permission(&self, id: &str) -> Result<bool, SqlError> {
        let mut tx = self.pool.begin().await.map_err(map_tx_error)?;

        sqlx::query("DELETE FROM role_permission WHERE permission_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let deleted = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        tx.commit().await.map_err(map_tx_error)?;

        Ok(deleted > 0)
    }

    async fn list_member_cards(&self) -> Result<Vec<MemberCardRecord>, SqlError> {
        sqlx::query_as::<_, MemberCardRecord>("SELECT * FROM member_cards ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn get_member_card(&self, id: i64) -> Result<Option<MemberCardRecord>, SqlError> {
        sqlx::query_as::<_, MemberCardRecord>("SELECT * FROM member_cards WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn create_order(&self, order: &OrderRecord) -> Result<(), SqlError> {
        let query = PostgresQueryHelper::get_order_insert_query();
        sqlx::query(&query)
            .bind(&order.id)
            .bind(&order.user_id)
            .bind(order.card_id)
            .bind(order.amount)
            .bind(&order.status)
            .bind(order.purchase_time)
            .bind(order.payment_time)
            .bind(order.created_at)
            .bind(order.updated_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get_order(&self, id: &str) -> Result<Option<OrderRecord>, SqlError> {
        sqlx::query_as::<_, OrderRecord>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_user_orders(&self, user_id: &str) -> Result<Vec<OrderRecord>, SqlError> {
        sqlx::query_as::<_, OrderRecord>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn pay_order(&self, id: &str, now: DateTime<Utc>) -> Result<PaymentOutcome, SqlError> {
        let mut tx = self.pool.begin().await.map_err(map_tx_error)?;

        // the conditional update row-locks the order until commit
        let flipped = sqlx::query(
            "UPDATE orders SET status = $1, payment_time = $2, updated_at = $3 WHERE id = $4 AND status = $5",
        )
        .bind(OrderStatus::Paid.as_str())
        .bind(now)
        .bind(now)
        .bind(id)
        .bind(OrderStatus::Created.as_str())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();

        let order = sqlx::query_as::<_, OrderRecord>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| SqlError::NotFound(format!("order {}", id)))?;

        if flipped == 0 {
            return match order.status()? {
                OrderStatus::Paid => Ok(PaymentOutcome::AlreadyPaid),
                status => Err(SqlError::InvalidRecord(format!(
                    "order {} is {} and cannot be paid",
                    id, status
                ))),
            };
        }

        let duration_days =
            sqlx::query_scalar::<_, i32>("SELECT duration_days FROM member_cards WHERE id = $1")
                .bind(order.card_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_error)?
                .ok_or_else(|| SqlError::NotFound(format!("member card {}", order.card_id)))?;

        let current_expiry = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT member_expiry FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(&order.user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| SqlError::NotFound(format!("user {}", order.user_id)))?;

        let member_expiry = extend_membership(current_expiry, now, duration_days);

        sqlx::query("UPDATE users SET member_expiry = $1, updated_at = $2 WHERE id = $3")
            .bind(member_expiry)
            .bind(now)
            .bind(&order.user_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_tx_error)?;

        debug!(
            "Order {} paid, membership of {} runs until {}",
            id, order.user_id, member_expiry
        );

        Ok(PaymentOutcome::Paid { member_expiry })
    }

    async fn close_order(&self, id: &str, status: OrderStatus) -> Result<bool, SqlError> {
        if !matches!(status, OrderStatus::Cancelled | OrderStatus::Failed) {
            return Err(SqlError::InvalidRecord(format!(
                "orders cannot be closed as {}",
                status
            )));
        }

        let result = sqlx::query(
            "UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4",
        )
        .bind(status.as_str())
        .bind(get_utc_datetime())
        .bind(id)
        .bind(OrderStatus::Created.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
