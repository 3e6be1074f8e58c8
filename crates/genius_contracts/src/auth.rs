use crate::rbac::validate_method;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyPermissionRequest {
    #[validate(custom(function = "validate_method"))]
    pub method: String,
    #[validate(length(min = 1, message = "path is required"))]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPermissionResponse {
    pub has_permission: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

impl RefreshTokenRequest {
    /// The token with an optional `Bearer ` prefix removed
    pub fn token(&self) -> &str {
        let token = self.refresh_token.trim();
        token.strip_prefix("Bearer ").unwrap_or(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_token_strips_bearer() {
        let request = RefreshTokenRequest {
            refresh_token: "Bearer abc.def.ghi".to_string(),
        };
        assert_eq!(request.token(), "abc.def.ghi");

        let request = RefreshTokenRequest {
            refresh_token: "abc.def.ghi".to_string(),
        };
        assert_eq!(request.token(), "abc.def.ghi");
    }

    #[test]
    fn test_verify_request_validation() {
        let request = VerifyPermissionRequest {
            method: "GET".to_string(),
            path: "/api/v1/users".to_string(),
        };
        assert!(request.validate().is_ok());

        let request = VerifyPermissionRequest {
            method: "HEAD".to_string(),
            path: "/api/v1/users".to_string(),
        };
        assert!(request.validate().is_err());
    }
}
