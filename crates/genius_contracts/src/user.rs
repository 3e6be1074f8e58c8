use chrono::{DateTime, Utc};
use genius_sql::schemas::schema::{RoleRecord, UserRecord};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 30, message = "username must be 3-30 characters"))]
    pub username: String,
    #[validate(length(min = 6, max = 30, message = "password must be 6-30 characters"))]
    pub password: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Partial profile update. Changing the password requires the old one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 30, message = "username must be 3-30 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    pub old_password: Option<String>,
    #[validate(length(min = 6, max = 30, message = "password must be 6-30 characters"))]
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserRoleRequest {
    #[validate(length(min = 1, message = "role_ids must not be empty"))]
    pub role_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub id: String,
    pub username: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleInfo {
    pub id: i64,
    pub role_name: String,
    pub name: String,
}

impl From<&RoleRecord> for RoleInfo {
    fn from(role: &RoleRecord) -> Self {
        RoleInfo {
            id: role.id,
            role_name: role.role_name.clone(),
            name: role.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub member_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<RoleInfo>,
}

impl UserResponse {
    pub fn with_roles(user: &UserRecord, roles: &[RoleRecord]) -> Self {
        UserResponse {
            roles: roles.iter().map(RoleInfo::from).collect(),
            ..UserResponse::from(user)
        }
    }
}

impl From<&UserRecord> for UserResponse {
    fn from(user: &UserRecord) -> Self {
        UserResponse {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            member_expiry: user.member_expiry,
            created_at: user.created_at,
            roles: Vec::new(),
        }
    }
}
