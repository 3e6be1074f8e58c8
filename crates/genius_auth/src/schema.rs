use serde::{Deserialize, Serialize};

/// JWT payload issued at login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}
