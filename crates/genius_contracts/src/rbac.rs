use genius_sql::schemas::arguments::RoleArgs;
use genius_sql::schemas::schema::{PermissionRecord, RoleRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

/// Methods a permission can be granted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(format!("unsupported method: {}", s)),
        }
    }
}

pub fn validate_method(method: &str) -> Result<(), ValidationError> {
    HttpMethod::from_str(method).map(|_| ()).map_err(|_| {
        ValidationError::new("method")
            .with_message("method must be one of GET, POST, PUT, PATCH, DELETE".into())
    })
}

/// Body of both role creation and role update
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoleRequest {
    #[validate(length(min = 2, max = 32, message = "role_name must be 2-32 characters"))]
    pub role_name: String,
    #[validate(length(min = 2, max = 32, message = "name must be 2-32 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "description must be at most 255 characters"))]
    pub description: String,
    #[serde(default)]
    pub is_super: bool,
}

impl From<&RoleRequest> for RoleArgs {
    fn from(request: &RoleRequest) -> Self {
        RoleArgs {
            role_name: request.role_name.trim().to_string(),
            name: request.name.trim().to_string(),
            description: request.description.clone(),
            is_super: request.is_super,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RolePermissionRequest {
    #[validate(length(min = 1, message = "permission_ids must not be empty"))]
    pub permission_ids: Vec<String>,
}

/// Body of both permission creation and permission update
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PermissionRequest {
    #[validate(custom(function = "validate_method"))]
    pub method: String,
    #[validate(length(min = 1, max = 255, message = "path_pattern must be 1-255 characters"))]
    pub path_pattern: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "description must be at most 255 characters"))]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionInfo {
    pub id: String,
    pub method: String,
    pub path_pattern: String,
    pub description: String,
}

impl From<&PermissionRecord> for PermissionInfo {
    fn from(permission: &PermissionRecord) -> Self {
        PermissionInfo {
            id: permission.id.clone(),
            method: permission.method.clone(),
            path_pattern: permission.path_pattern.clone(),
            description: permission.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleResponse {
    pub id: i64,
    pub role_name: String,
    pub name: String,
    pub description: String,
    pub is_super: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<PermissionInfo>>,
}

impl RoleResponse {
    pub fn with_permissions(role: &RoleRecord, permissions: &[PermissionRecord]) -> Self {
        RoleResponse {
            permissions: Some(permissions.iter().map(PermissionInfo::from).collect()),
            ..RoleResponse::from(role)
        }
    }
}

impl From<&RoleRecord> for RoleResponse {
    fn from(role: &RoleRecord) -> Self {
        RoleResponse {
            id: role.id,
            role_name: role.role_name.clone(),
            name: role.name.clone(),
            description: role.description.clone(),
            is_super: role.is_super,
            permissions: None,
        }
    }
}
