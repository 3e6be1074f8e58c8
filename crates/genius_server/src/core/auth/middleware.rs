use crate::core::error::{forbidden, internal_server_error, unauthorized, ApiError};
use crate::core::state::AppState;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use genius_auth::permission::has_permission;
use genius_auth::schema::Claims;
use std::sync::Arc;
use tracing::debug;

/// Read the access token from the `access_token` cookie or a bearer header
fn access_token(cookie_jar: &CookieJar, req: &Request) -> Option<String> {
    cookie_jar
        .get("access_token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| {
                    auth_value
                        .strip_prefix("Bearer ")
                        .map(|token| token.trim().to_owned())
                })
        })
}

/// Validate the JWT and attach its [`Claims`] to the request
pub async fn jwt_middleware(
    cookie_jar: CookieJar,
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = access_token(&cookie_jar, &req)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| unauthorized("No access token provided"))?;

    let claims = state.auth_manager.validate_jwt(&token).map_err(|e| {
        debug!("Rejected token: {}", e);
        unauthorized("Invalid or expired token")
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Allow the request only when one of the caller's roles grants its method and path.
/// Must run after [`jwt_middleware`].
pub async fn rbac_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = req
        .extensions()
        .get::<Claims>()
        .map(|claims| claims.user_id.clone())
        .ok_or_else(|| unauthorized("No access token provided"))?;

    let allowed = has_permission(
        state.sql_client.as_ref(),
        &user_id,
        req.method().as_str(),
        req.uri().path(),
    )
    .await
    .map_err(internal_server_error)?;

    if !allowed {
        return Err(forbidden("Permission denied"));
    }

    Ok(next.run(req).await)
}

/// Handlers open to the owner of a resource check everyone else against RBAC here
pub async fn authorize_self_or_permission(
    state: &AppState,
    claims: &Claims,
    owner_id: &str,
    method: &str,
    path: &str,
) -> Result<(), ApiError> {
    if claims.user_id == owner_id {
        return Ok(());
    }

    let allowed = has_permission(state.sql_client.as_ref(), &claims.user_id, method, path)
        .await
        .map_err(internal_server_error)?;

    if allowed {
        Ok(())
    } else {
        Err(forbidden("Permission denied"))
    }
}
