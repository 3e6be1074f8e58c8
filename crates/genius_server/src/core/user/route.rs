use crate::core::auth::middleware::{authorize_self_or_permission, jwt_middleware, rbac_middleware};
use crate::core::error::{
    bad_request, check_uid, error_response, internal_server_error, not_found, ok, path_params,
    query_params, sql_error, unauthorized, validated, ApiError, ApiResult,
};
use crate::core::state::AppState;
use anyhow::{Context, Result};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::{
    middleware,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use genius_auth::schema::Claims;
use genius_contracts::user::{
    LoginRequest, RegisterRequest, RoleInfo, TokenResponse, UpdateUserRequest, UserResponse,
    UserRoleRequest,
};
use genius_contracts::{PageResponse, Pagination};
use genius_sql::base::SqlClient;
use genius_sql::schemas::arguments::PageArgs;
use genius_sql::schemas::schema::UserRecord;
use genius_sql::seed::REGULAR_ROLE;
use genius_utils::utils::get_utc_datetime;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info};

async fn load_user(state: &AppState, id: &str) -> Result<UserRecord, ApiError> {
    state
        .sql_client
        .get_user(id)
        .await
        .map_err(sql_error)?
        .ok_or_else(|| not_found(format!("User {} not found", id)))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<TokenResponse> {
    let request = validated(payload)?;

    let existing = state
        .sql_client
        .get_user_by_username(&request.username)
        .await
        .map_err(sql_error)?;

    if existing.is_some() {
        return Err(error_response(
            StatusCode::CONFLICT,
            "Username is already taken",
        ));
    }

    let user = UserRecord::new(
        request.username,
        state.auth_manager.hash_password(&request.password),
        request.email,
    );

    state
        .sql_client
        .create_user(&user, Some(REGULAR_ROLE))
        .await
        .map_err(sql_error)?;

    let token = state
        .auth_manager
        .generate_jwt(&user.id, &user.username)
        .map_err(internal_server_error)?;

    info!("Registered user {}", user.username);

    ok(
        "Registration successful",
        TokenResponse {
            id: user.id,
            username: user.username,
            token,
        },
    )
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<TokenResponse> {
    let request = validated(payload)?;

    let user = state
        .sql_client
        .get_user_by_username(&request.username)
        .await
        .map_err(sql_error)?
        .ok_or_else(|| unauthorized("Invalid username or password"))?;

    state
        .auth_manager
        .verify_password(&request.password, &user.password_hash)
        .map_err(|_| unauthorized("Invalid username or password"))?;

    let token = state
        .auth_manager
        .generate_jwt(&user.id, &user.username)
        .map_err(internal_server_error)?;

    ok(
        "Login successful",
        TokenResponse {
            id: user.id,
            username: user.username,
            token,
        },
    )
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> ApiResult<PageResponse<UserResponse>> {
    let pagination = query_params(query)?;
    let page = PageArgs::new(pagination.page, pagination.limit);

    let (users, total) = state
        .sql_client
        .list_users(&page)
        .await
        .map_err(sql_error)?;

    ok(
        "ok",
        PageResponse {
            list: users.iter().map(UserResponse::from).collect(),
            total,
            page: page.page,
            limit: page.limit,
        },
    )
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<String>, PathRejection>,
    method: Method,
    uri: Uri,
) -> ApiResult<UserResponse> {
    let id = path_params(path)?;
    check_uid(&id)?;
    authorize_self_or_permission(&state, &claims, &id, method.as_str(), uri.path()).await?;

    let user = load_user(&state, &id).await?;
    let roles = state
        .sql_client
        .get_user_roles(&user.id)
        .await
        .map_err(sql_error)?;

    ok("ok", UserResponse::with_roles(&user, &roles))
}

/// Update profile fields. Changing your own password requires the old one.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<String>, PathRejection>,
    method: Method,
    uri: Uri,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<UserResponse> {
    let id = path_params(path)?;
    check_uid(&id)?;
    authorize_self_or_permission(&state, &claims, &id, method.as_str(), uri.path()).await?;
    let request = validated(payload)?;

    let mut user = load_user(&state, &id).await?;

    if let Some(new_password) = request.new_password.as_deref() {
        if claims.user_id == user.id {
            let old_password = request
                .old_password
                .as_deref()
                .ok_or_else(|| bad_request("old_password is required to change the password"))?;

            state
                .auth_manager
                .verify_password(old_password, &user.password_hash)
                .map_err(|_| bad_request("old_password is incorrect"))?;
        }
        user.password_hash = state.auth_manager.hash_password(new_password);
    }

    if let Some(username) = request.username {
        user.username = username;
    }
    if let Some(email) = request.email {
        user.email = email;
    }
    user.updated_at = get_utc_datetime();

    let updated = state
        .sql_client
        .update_user(&user)
        .await
        .map_err(sql_error)?;

    if !updated {
        return Err(not_found(format!("User {} not found", id)));
    }

    ok("User updated", UserResponse::from(&user))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<()> {
    let id = path_params(path)?;
    check_uid(&id)?;
    let deleted = state
        .sql_client
        .delete_user(&id)
        .await
        .map_err(sql_error)?;

    if !deleted {
        return Err(not_found(format!("User {} not found", id)));
    }

    info!("Deleted user {}", id);
    ok("User deleted", ())
}

pub async fn add_user_roles(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UserRoleRequest>, JsonRejection>,
) -> ApiResult<Vec<RoleInfo>> {
    let id = path_params(path)?;
    check_uid(&id)?;
    let request = validated(payload)?;
    let user = load_user(&state, &id).await?;

    for role_id in &request.role_ids {
        let role = state
            .sql_client
            .get_role(*role_id)
            .await
            .map_err(sql_error)?;

        if role.is_none() {
            return Err(bad_request(format!("Unknown role id {}", role_id)));
        }
    }

    state
        .sql_client
        .add_roles_to_user(&user.id, &request.role_ids)
        .await
        .map_err(sql_error)?;

    let roles = state
        .sql_client
        .get_user_roles(&user.id)
        .await
        .map_err(sql_error)?;

    ok("Roles assigned", roles.iter().map(RoleInfo::from).collect())
}

pub async fn get_user_roles(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<String>, PathRejection>,
    method: Method,
    uri: Uri,
) -> ApiResult<Vec<RoleInfo>> {
    let id = path_params(path)?;
    check_uid(&id)?;
    authorize_self_or_permission(&state, &claims, &id, method.as_str(), uri.path()).await?;

    let user = load_user(&state, &id).await?;
    let roles = state
        .sql_client
        .get_user_roles(&user.id)
        .await
        .map_err(sql_error)?;

    ok("ok", roles.iter().map(RoleInfo::from).collect())
}

pub async fn remove_user_role(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> ApiResult<()> {
    let (id, role_id) = path_params(path)?;
    check_uid(&id)?;
    let removed = state
        .sql_client
        .remove_role_from_user(&id, role_id)
        .await
        .map_err(sql_error)?;

    if !removed {
        return Err(not_found(format!(
            "User {} does not hold role {}",
            id, role_id
        )));
    }

    ok("Role removed", ())
}

pub async fn get_user_router(
    prefix: &str,
    app_state: Arc<AppState>,
) -> Result<Router<Arc<AppState>>> {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let public = Router::new()
            .route(&format!("{}/users/register", prefix), post(register))
            .route(&format!("{}/users/login", prefix), post(login));

        // owners may read and edit their own account
        let owner = Router::new()
            .route(
                &format!("{}/users/:id", prefix),
                get(get_user).put(update_user),
            )
            .route(&format!("{}/users/:id/roles", prefix), get(get_user_roles))
            .route_layer(middleware::from_fn_with_state(
                app_state.clone(),
                jwt_middleware,
            ));

        let protected = Router::new()
            .route(&format!("{}/users", prefix), get(list_users))
            .route(&format!("{}/users/:id", prefix), delete(delete_user))
            .route(&format!("{}/users/:id/roles", prefix), post(add_user_roles))
            .route(
                &format!("{}/users/:id/roles/:role_id", prefix),
                delete(remove_user_role),
            )
            .route_layer(middleware::from_fn_with_state(
                app_state.clone(),
                rbac_middleware,
            ))
            .route_layer(middleware::from_fn_with_state(app_state, jwt_middleware));

        public.merge(owner).merge(protected)
    }));

    match result {
        Ok(router) => Ok(router),
        Err(_) => {
            error!("Failed to create user router");
            Err(anyhow::anyhow!("Failed to create user router"))
                .context("Panic occurred while creating the router")
        }
    }
}
