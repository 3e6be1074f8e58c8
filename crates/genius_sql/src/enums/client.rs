use crate::base::SqlClient;
use crate::postgres::client::PostgresClient;
use crate::schemas::arguments::{PageArgs, RoleArgs};
use crate::schemas::schema::{
    MemberCardRecord, OrderRecord, OrderStatus, PaymentOutcome, PermissionGrant,
    PermissionRecord, RoleRecord, SeedSummary, UserRecord,
};
use crate::sqlite::client::SqliteClient;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use genius_error::SqlError;
use genius_settings::config::{DatabaseSettings, SqlType};

pub enum SqlClientEnum {
    Postgres(PostgresClient),
    Sqlite(SqliteClient),
}

impl SqlClientEnum {
    pub fn name(&self) -> String {
        match self {
            SqlClientEnum::Postgres(_) => SqlType::Postgres.to_string(),
            SqlClientEnum::Sqlite(_) => SqlType::Sqlite.to_string(),
        }
    }
}

#[async_trait]
impl SqlClient for SqlClientEnum {
    async fn new(settings: &DatabaseSettings) -> Result<Self, SqlError> {
        match settings.sql_type {
            SqlType::Postgres => {
                let client = PostgresClient::new(settings).await?;
                Ok(SqlClientEnum::Postgres(client))
            }
            SqlType::Sqlite => {
                let client = SqliteClient::new(settings).await?;
                Ok(SqlClientEnum::Sqlite(client))
            }
        }
    }

    async fn run_migrations(&self) -> Result<(), SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.run_migrations().await,
            SqlClientEnum::Sqlite(client) => client.run_migrations().await,
        }
    }

    async fn seed_defaults(&self) -> Result<SeedSummary, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.seed_defaults().await,
            SqlClientEnum::Sqlite(client) => client.seed_defaults().await,
        }
    }

    async fn create_user(
        &self,
        user: &UserRecord,
        role_name: Option<&str>,
    ) -> Result<(), SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.create_user(user, role_name).await,
            SqlClientEnum::Sqlite(client) => client.create_user(user, role_name).await,
        }
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.get_user(id).await,
            SqlClientEnum::Sqlite(client) => client.get_user(id).await,
        }
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.get_user_by_username(username).await,
            SqlClientEnum::Sqlite(client) => client.get_user_by_username(username).await,
        }
    }

    async fn update_user(&self, user: &UserRecord) -> Result<bool, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.update_user(user).await,
            SqlClientEnum::Sqlite(client) => client.update_user(user).await,
        }
    }

    async fn delete_user(&self, id: &str) -> Result<bool, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.delete_user(id).await,
            SqlClientEnum::Sqlite(client) => client.delete_user(id).await,
        }
    }

    async fn list_users(&self, page: &PageArgs) -> Result<(Vec<UserRecord>, i64), SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.list_users(page).await,
            SqlClientEnum::Sqlite(client) => client.list_users(page).await,
        }
    }

    async fn add_roles_to_user(&self, user_id: &str, role_ids: &[i64]) -> Result<(), SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.add_roles_to_user(user_id, role_ids).await,
            SqlClientEnum::Sqlite(client) => client.add_roles_to_user(user_id, role_ids).await,
        }
    }

    async fn get_user_roles(&self, user_id: &str) -> Result<Vec<RoleRecord>, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.get_user_roles(user_id).await,
            SqlClientEnum::Sqlite(client) => client.get_user_roles(user_id).await,
        }
    }

    async fn remove_role_from_user(&self, user_id: &str, role_id: i64) -> Result<bool, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.remove_role_from_user(user_id, role_id).await,
            SqlClientEnum::Sqlite(client) => client.remove_role_from_user(user_id, role_id).await,
        }
    }

    async fn get_permission_grants(&self, user_id: &str) -> Result<Vec<PermissionGrant>, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.get_permission_grants(user_id).await,
            SqlClientEnum::Sqlite(client) => client.get_permission_grants(user_id).await,
        }
    }

    async fn consume_daily_use(
        &self,
        user_id: &str,
        today: NaiveDate,
        daily_limit: i32,
    ) -> Result<Option<i32>, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => {
                client.consume_daily_use(user_id, today, daily_limit).await
            }
            SqlClientEnum::Sqlite(client) => {
                client.consume_daily_use(user_id, today, daily_limit).await
            }
        }
    }

    async fn create_role(&self, args: &RoleArgs) -> Result<RoleRecord, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.create_role(args).await,
            SqlClientEnum::Sqlite(client) => client.create_role(args).await,
        }
    }

    async fn get_role(&self, id: i64) -> Result<Option<RoleRecord>, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.get_role(id).await,
            SqlClientEnum::Sqlite(client) => client.get_role(id).await,
        }
    }

    async fn get_role_by_name(&self, role_name: &str) -> Result<Option<RoleRecord>, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.get_role_by_name(role_name).await,
            SqlClientEnum::Sqlite(client) => client.get_role_by_name(role_name).await,
        }
    }

    async fn list_roles(&self, page: &PageArgs) -> Result<(Vec<RoleRecord>, i64), SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.list_roles(page).await,
            SqlClientEnum::Sqlite(client) => client.list_roles(page).await,
        }
    }

    async fn update_role(&self, id: i64, args: &RoleArgs) -> Result<bool, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.update_role(id, args).await,
            SqlClientEnum::Sqlite(client) => client.update_role(id, args).await,
        }
    }

    async fn delete_role(&self, id: i64) -> Result<bool, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.delete_role(id).await,
            SqlClientEnum::Sqlite(client) => client.delete_role(id).await,
        }
    }

    async fn add_permissions_to_role(
        &self,
        role_id: i64,
        permission_ids: &[String],
    ) -> Result<(), SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => {
                client.add_permissions_to_role(role_id, permission_ids).await
            }
            SqlClientEnum::Sqlite(client) => {
                client.add_permissions_to_role(role_id, permission_ids).await
            }
        }
    }

    async fn get_role_permissions(&self, role_id: i64) -> Result<Vec<PermissionRecord>, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.get_role_permissions(role_id).await,
            SqlClientEnum::Sqlite(client) => client.get_role_permissions(role_id).await,
        }
    }

    async fn remove_permission_from_role(
        &self,
        role_id: i64,
        permission_id: &str,
    ) -> Result<bool, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => {
                client.remove_permission_from_role(role_id, permission_id).await
            }
            SqlClientEnum::Sqlite(client) => {
                client.remove_permission_from_role(role_id, permission_id).await
            }
        }
    }

    async fn create_permission(&self, permission: &PermissionRecord) -> Result<(), SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.create_permission(permission).await,
            SqlClientEnum::Sqlite(client) => client.create_permission(permission).await,
        }
    }

    async fn get_permission(&self, id: &str) -> Result<Option<PermissionRecord>, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.get_permission(id).await,
            SqlClientEnum::Sqlite(client) => client.get_permission(id).await,
        }
    }

    async fn list_permissions(&self) -> Result<Vec<PermissionRecord>, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.list_permissions().await,
            SqlClientEnum::Sqlite(client) => client.list_permissions().await,
        }
    }

    async fn update_permission(&self, permission: &PermissionRecord) -> Result<bool, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.update_permission(permission).await,
            SqlClientEnum::Sqlite(client) => client.update_permission(permission).await,
        }
    }

    async fn delete_permission(&self, id: &str) -> Result<bool, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.delete_permission(id).await,
            SqlClientEnum::Sqlite(client) => client.delete_permission(id).await,
        }
    }

    async fn list_member_cards(&self) -> Result<Vec<MemberCardRecord>, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.list_member_cards().await,
            SqlClientEnum::Sqlite(client) => client.list_member_cards().await,
        }
    }

    async fn get_member_card(&self, id: i64) -> Result<Option<MemberCardRecord>, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.get_member_card(id).await,
            SqlClientEnum::Sqlite(client) => client.get_member_card(id).await,
        }
    }

    async fn create_order(&self, order: &OrderRecord) -> Result<(), SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.create_order(order).await,
            SqlClientEnum::Sqlite(client) => client.create_order(order).await,
        }
    }

    async fn get_order(&self, id: &str) -> Result<Option<OrderRecord>, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.get_order(id).await,
            SqlClientEnum::Sqlite(client) => client.get_order(id).await,
        }
    }

    async fn list_user_orders(&self, user_id: &str) -> Result<Vec<OrderRecord>, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.list_user_orders(user_id).await,
            SqlClientEnum::Sqlite(client) => client.list_user_orders(user_id).await,
        }
    }

    async fn pay_order(&self, id: &str, now: DateTime<Utc>) -> Result<PaymentOutcome, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.pay_order(id, now).await,
            SqlClientEnum::Sqlite(client) => client.pay_order(id, now).await,
        }
    }

    async fn close_order(&self, id: &str, status: OrderStatus) -> Result<bool, SqlError> {
        match self {
            SqlClientEnum::Postgres(client) => client.close_order(id, status).await,
            SqlClientEnum::Sqlite(client) => client.close_order(id, status).await,
        }
    }
}
