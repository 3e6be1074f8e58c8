use crate::core::auth::middleware::{jwt_middleware, rbac_middleware};
use crate::core::error::{check_uid, not_found, ok, path_params, sql_error, validated, ApiResult};
use crate::core::state::AppState;
use anyhow::{Context, Result};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::{middleware, routing::get, Json, Router};
use genius_contracts::rbac::{PermissionInfo, PermissionRequest};
use genius_sql::base::SqlClient;
use genius_sql::schemas::schema::PermissionRecord;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info};

pub async fn create_permission(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PermissionRequest>, JsonRejection>,
) -> ApiResult<PermissionInfo> {
    let request = validated(payload)?;
    let permission = PermissionRecord::new(
        &request.method,
        &request.path_pattern,
        &request.description,
    );

    state
        .sql_client
        .create_permission(&permission)
        .await
        .map_err(sql_error)?;

    info!(
        "Created permission {} {}",
        permission.method, permission.path_pattern
    );
    ok("Permission created", PermissionInfo::from(&permission))
}

pub async fn list_permissions(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<PermissionInfo>> {
    let permissions = state
        .sql_client
        .list_permissions()
        .await
        .map_err(sql_error)?;

    ok("ok", permissions.iter().map(PermissionInfo::from).collect())
}

pub async fn get_permission(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<PermissionInfo> {
    let id = path_params(path)?;
    check_uid(&id)?;
    let permission = state
        .sql_client
        .get_permission(&id)
        .await
        .map_err(sql_error)?
        .ok_or_else(|| not_found(format!("Permission {} not found", id)))?;

    ok("ok", PermissionInfo::from(&permission))
}

pub async fn update_permission(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<PermissionRequest>, JsonRejection>,
) -> ApiResult<PermissionInfo> {
    let id = path_params(path)?;
    check_uid(&id)?;
    let request = validated(payload)?;

    let existing = state
        .sql_client
        .get_permission(&id)
        .await
        .map_err(sql_error)?
        .ok_or_else(|| not_found(format!("Permission {} not found", id)))?;

    // normalize the same way new permissions are
    let normalized = PermissionRecord::new(
        &request.method,
        &request.path_pattern,
        &request.description,
    );
    let permission = PermissionRecord {
        id: existing.id,
        created_at: existing.created_at,
        ..normalized
    };

    let updated = state
        .sql_client
        .update_permission(&permission)
        .await
        .map_err(sql_error)?;

    if !updated {
        return Err(not_found(format!("Permission {} not found", id)));
    }

    ok("Permission updated", PermissionInfo::from(&permission))
}

pub async fn delete_permission(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<()> {
    let id = path_params(path)?;
    check_uid(&id)?;
    let deleted = state
        .sql_client
        .delete_permission(&id)
        .await
        .map_err(sql_error)?;

    if !deleted {
        return Err(not_found(format!("Permission {} not found", id)));
    }

    info!("Deleted permission {}", id);
    ok("Permission deleted", ())
}

pub async fn get_permission_router(
    prefix: &str,
    app_state: Arc<AppState>,
) -> Result<Router<Arc<AppState>>> {
    let result = catch_unwind(AssertUnwindSafe(|| {
        Router::new()
            .route(
                &format!("{}/permissions", prefix),
                get(list_permissions).post(create_permission),
            )
            .route(
                &format!("{}/permissions/:id", prefix),
                get(get_permission)
                    .put(update_permission)
                    .delete(delete_permission),
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
            error!("Failed to create permission router");
            Err(anyhow::anyhow!("Failed to create permission router"))
                .context("Panic occurred while creating the router")
        }
    }
}
