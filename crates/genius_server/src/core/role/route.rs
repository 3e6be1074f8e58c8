use crate::core::auth::middleware::{jwt_middleware, rbac_middleware};
use crate::core::error::{
    bad_request, check_uid, not_found, ok, path_params, query_params, sql_error, validated,
    ApiError, ApiResult,
};
use crate::core::state::AppState;
use anyhow::{Context, Result};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::{
    middleware,
    routing::{delete, get},
    Json, Router,
};
use genius_contracts::rbac::{PermissionInfo, RolePermissionRequest, RoleRequest, RoleResponse};
use genius_contracts::{PageResponse, Pagination};
use genius_sql::base::SqlClient;
use genius_sql::schemas::arguments::{PageArgs, RoleArgs};
use genius_sql::schemas::schema::RoleRecord;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info};

async fn load_role(state: &AppState, id: i64) -> Result<RoleRecord, ApiError> {
    state
        .sql_client
        .get_role(id)
        .await
        .map_err(sql_error)?
        .ok_or_else(|| not_found(format!("Role {} not found", id)))
}

pub async fn create_role(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RoleRequest>, JsonRejection>,
) -> ApiResult<RoleResponse> {
    let request = validated(payload)?;

    let role = state
        .sql_client
        .create_role(&RoleArgs::from(&request))
        .await
        .map_err(sql_error)?;

    info!("Created role {}", role.role_name);
    ok("Role created", RoleResponse::from(&role))
}

pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> ApiResult<PageResponse<RoleResponse>> {
    let pagination = query_params(query)?;
    let page = PageArgs::new(pagination.page, pagination.limit);

    let (roles, total) = state
        .sql_client
        .list_roles(&page)
        .await
        .map_err(sql_error)?;

    ok(
        "ok",
        PageResponse {
            list: roles.iter().map(RoleResponse::from).collect(),
            total,
            page: page.page,
            limit: page.limit,
        },
    )
}

pub async fn get_role(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<RoleResponse> {
    let id = path_params(path)?;
    let role = load_role(&state, id).await?;
    let permissions = state
        .sql_client
        .get_role_permissions(role.id)
        .await
        .map_err(sql_error)?;

    ok("ok", RoleResponse::with_permissions(&role, &permissions))
}

pub async fn update_role(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RoleRequest>, JsonRejection>,
) -> ApiResult<RoleResponse> {
    let id = path_params(path)?;
    let request = validated(payload)?;

    let updated = state
        .sql_client
        .update_role(id, &RoleArgs::from(&request))
        .await
        .map_err(sql_error)?;

    if !updated {
        return Err(not_found(format!("Role {} not found", id)));
    }

    let role = load_role(&state, id).await?;
    ok("Role updated", RoleResponse::from(&role))
}

/// Delete a role together with its user and permission links
pub async fn delete_role(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<()> {
    let id = path_params(path)?;
    let deleted = state
        .sql_client
        .delete_role(id)
        .await
        .map_err(sql_error)?;

    if !deleted {
        return Err(not_found(format!("Role {} not found", id)));
    }

    info!("Deleted role {}", id);
    ok("Role deleted", ())
}

pub async fn add_role_permissions(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RolePermissionRequest>, JsonRejection>,
) -> ApiResult<RoleResponse> {
    let id = path_params(path)?;
    let request = validated(payload)?;
    let role = load_role(&state, id).await?;

    for permission_id in &request.permission_ids {
        let permission = state
            .sql_client
            .get_permission(permission_id)
            .await
            .map_err(sql_error)?;

        if permission.is_none() {
            return Err(bad_request(format!(
                "Unknown permission id {}",
                permission_id
            )));
        }
    }

    state
        .sql_client
        .add_permissions_to_role(role.id, &request.permission_ids)
        .await
        .map_err(sql_error)?;

    let permissions = state
        .sql_client
        .get_role_permissions(role.id)
        .await
        .map_err(sql_error)?;

    ok(
        "Permissions attached",
        RoleResponse::with_permissions(&role, &permissions),
    )
}

pub async fn get_role_permissions(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<PermissionInfo>> {
    let id = path_params(path)?;
    let role = load_role(&state, id).await?;
    let permissions = state
        .sql_client
        .get_role_permissions(role.id)
        .await
        .map_err(sql_error)?;

    ok("ok", permissions.iter().map(PermissionInfo::from).collect())
}

pub async fn remove_role_permission(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(i64, String)>, PathRejection>,
) -> ApiResult<()> {
    let (id, permission_id) = path_params(path)?;
    check_uid(&permission_id)?;
    let removed = state
        .sql_client
        .remove_permission_from_role(id, &permission_id)
        .await
        .map_err(sql_error)?;

    if !removed {
        return Err(not_found(format!(
            "Role {} does not hold permission {}",
            id, permission_id
        )));
    }

    ok("Permission detached", ())
}

pub async fn get_role_router(
    prefix: &str,
    app_state: Arc<AppState>,
) -> Result<Router<Arc<AppState>>> {
    let result = catch_unwind(AssertUnwindSafe(|| {
        Router::new()
            .route(
                &format!("{}/roles", prefix),
                get(list_roles).post(create_role),
            )
            .route(
                &format!("{}/roles/:id", prefix),
                get(get_role).put(update_role).delete(delete_role),
            )
            .route(
                &format!("{}/roles/:id/permissions", prefix),
                get(get_role_permissions).post(add_role_permissions),
            )
            .route(
                &format!("{}/roles/:id/permissions/:permission_id", prefix),
                delete(remove_role_permission),
            )
            .route_layer(middleware::from_fn_with_state(
                app_state.clone(),
                rbac_middleware,
            ))
            .route_layer(middleware::from_fn_with_state(app_state, jwt_middleware))
    }));

    match result {
        Ok(router) => Ok(router),
        Err(_) => {
            error!("Failed to create role router");
            Err(anyhow::anyhow!("Failed to create role router"))
                .context("Panic occurred while creating the router")
        }
    }
}
