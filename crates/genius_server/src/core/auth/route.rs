use crate::core::auth::middleware::jwt_middleware;
use crate::core::error::{
    internal_server_error, ok, sql_error, unauthorized, validated, ApiResult,
};
use crate::core::state::AppState;
use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{middleware, routing::post, Extension, Json, Router};
use genius_auth::permission::has_permission;
use genius_auth::schema::Claims;
use genius_contracts::auth::{RefreshTokenRequest, VerifyPermissionRequest, VerifyPermissionResponse};
use genius_contracts::user::TokenResponse;
use genius_sql::base::SqlClient;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info};

/// Evaluate a method and path against the caller's own roles
pub async fn verify_permission(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<VerifyPermissionRequest>, JsonRejection>,
) -> ApiResult<VerifyPermissionResponse> {
    let request = validated(payload)?;

    let allowed = has_permission(
        state.sql_client.as_ref(),
        &claims.user_id,
        &request.method,
        &request.path,
    )
    .await
    .map_err(internal_server_error)?;

    ok(
        "Permission evaluated",
        VerifyPermissionResponse {
            has_permission: allowed,
        },
    )
}

/// Exchange a still valid token for a fresh one.
///
/// The token in the body must belong to the same user as the bearer token.
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> ApiResult<TokenResponse> {
    let request = validated(payload)?;

    let refreshed = state
        .auth_manager
        .validate_jwt(request.token())
        .map_err(|_| unauthorized("Invalid or expired token"))?;

    if refreshed.user_id != claims.user_id {
        return Err(unauthorized("Token does not belong to the caller"));
    }

    let user = state
        .sql_client
        .get_user(&claims.user_id)
        .await
        .map_err(sql_error)?
        .ok_or_else(|| unauthorized("User no longer exists"))?;

    let token = state
        .auth_manager
        .generate_jwt(&user.id, &user.username)
        .map_err(internal_server_error)?;

    info!("Refreshed token for user {}", user.username);

    ok(
        "Token refreshed",
        TokenResponse {
            id: user.id,
            username: user.username,
            token,
        },
    )
}

pub async fn get_auth_router(prefix: &str, app_state: Arc<AppState>) -> Result<Router<Arc<AppState>>> {
    let result = catch_unwind(AssertUnwindSafe(|| {
        Router::new()
            .route(&format!("{}/auth/verify", prefix), post(verify_permission))
            .route(&format!("{}/auth/refresh", prefix), post(refresh_token))
            .route_layer(middleware::from_fn_with_state(app_state, jwt_middleware))
    }));

    match result {
        Ok(router) => Ok(router),
        Err(_) => {
            error!("Failed to create auth router");
            Err(anyhow::anyhow!("Failed to create auth router"))
                .context("Panic occurred while creating the router")
        }
    }
}
