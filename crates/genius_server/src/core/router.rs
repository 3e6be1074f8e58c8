use crate::core::auth::route::get_auth_router;
use crate::core::health::route::get_health_router;
use crate::core::member::route::get_member_router;
use crate::core::payment::route::get_payment_router;
use crate::core::permission::route::get_permission_router;
use crate::core::role::route::get_role_router;
use crate::core::state::AppState;
use crate::core::user::route::get_user_router;
use anyhow::Result;
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub const ROUTE_PREFIX: &str = "/api/v1";

pub async fn create_router(app_state: Arc<AppState>) -> Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::PUT,
            Method::DELETE,
            Method::POST,
            Method::PATCH,
        ])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    let health_routes = get_health_router(ROUTE_PREFIX).await;
    let auth_routes = get_auth_router(ROUTE_PREFIX, app_state.clone()).await?;
    let user_routes = get_user_router(ROUTE_PREFIX, app_state.clone()).await?;
    let role_routes = get_role_router(ROUTE_PREFIX, app_state.clone()).await?;
    let permission_routes = get_permission_router(ROUTE_PREFIX, app_state.clone()).await?;
    let member_routes = get_member_router(ROUTE_PREFIX, app_state.clone()).await?;
    let payment_routes = get_payment_router(ROUTE_PREFIX, app_state.clone()).await?;

    Ok(Router::new()
        .merge(health_routes)
        .merge(auth_routes)
        .merge(user_routes)
        .merge(role_routes)
        .merge(permission_routes)
        .merge(member_routes)
        .merge(payment_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state))
}
