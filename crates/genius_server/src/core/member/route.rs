use crate::core::auth::middleware::{jwt_middleware, rbac_middleware};
use crate::core::error::{
    bad_request, check_uid, not_found, ok, path_params, sql_error, validated, ApiError, ApiResult,
};
use crate::core::state::AppState;
use anyhow::{Context, Result};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use genius_auth::schema::Claims;
use genius_contracts::member::{
    CreateOrderRequest, MemberCardInfo, MemberCardList, MemberInfoResponse, OrderList,
    OrderResponse, PayOrderResponse, ServiceCheckResponse,
};
use genius_contracts::ApiResponse;
use genius_sql::base::SqlClient;
use genius_sql::schemas::schema::{
    MemberCardRecord, OrderRecord, OrderStatus, PaymentOutcome, ServiceAccess,
};
use genius_utils::utils::get_utc_datetime;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info};

/// Look up a card by id, answering 400 for unknown cards
pub async fn load_card(state: &AppState, card_id: i64) -> Result<MemberCardRecord, ApiError> {
    state
        .sql_client
        .get_member_card(card_id)
        .await
        .map_err(sql_error)?
        .ok_or_else(|| bad_request(format!("Unknown member card {}", card_id)))
}

/// Create a `created` order for `card` at its current price
pub async fn place_order(
    state: &AppState,
    user_id: &str,
    card: &MemberCardRecord,
) -> Result<OrderRecord, ApiError> {
    let order = OrderRecord::new(user_id.to_string(), card.id, card.price);

    state
        .sql_client
        .create_order(&order)
        .await
        .map_err(sql_error)?;

    info!(
        "User {} ordered {} for {} fen",
        user_id, card.name, order.amount
    );

    Ok(order)
}

pub async fn list_cards(State(state): State<Arc<AppState>>) -> ApiResult<MemberCardList> {
    let cards = state
        .sql_client
        .list_member_cards()
        .await
        .map_err(sql_error)?;

    ok(
        "ok",
        MemberCardList {
            cards: cards.iter().map(MemberCardInfo::from).collect(),
        },
    )
}

/// Membership status of the caller, without counting a use
pub async fn member_info(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<MemberInfoResponse> {
    let user = state
        .sql_client
        .get_user(&claims.user_id)
        .await
        .map_err(sql_error)?
        .ok_or_else(|| not_found("User not found"))?;

    let daily_limit = state.config.daily_free_uses;
    let response = match user.service_access(get_utc_datetime(), daily_limit) {
        ServiceAccess::Member { expiry } => MemberInfoResponse {
            is_member: true,
            expiry_time: Some(expiry),
            daily_free_uses: daily_limit,
            remaining_today: None,
        },
        ServiceAccess::Granted { remaining } => MemberInfoResponse {
            is_member: false,
            expiry_time: user.member_expiry,
            daily_free_uses: daily_limit,
            remaining_today: Some(remaining),
        },
        ServiceAccess::Denied => MemberInfoResponse {
            is_member: false,
            expiry_time: user.member_expiry,
            daily_free_uses: daily_limit,
            remaining_today: Some(0),
        },
    };

    ok("ok", response)
}

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> ApiResult<OrderResponse> {
    let request = validated(payload)?;
    let card = load_card(&state, request.card_id).await?;
    let order = place_order(&state, &claims.user_id, &card).await?;

    ok("Order created", OrderResponse::from(&order))
}

pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<OrderList> {
    let orders = state
        .sql_client
        .list_user_orders(&claims.user_id)
        .await
        .map_err(sql_error)?;

    ok(
        "ok",
        OrderList {
            orders: orders.iter().map(OrderResponse::from).collect(),
        },
    )
}

/// Cancel one of the caller's unpaid orders
pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<OrderResponse> {
    let id = path_params(path)?;
    check_uid(&id)?;
    let order = state
        .sql_client
        .get_order(&id)
        .await
        .map_err(sql_error)?
        // other users' orders are reported as missing
        .filter(|order| order.user_id == claims.user_id)
        .ok_or_else(|| not_found(format!("Order {} not found", id)))?;

    let closed = state
        .sql_client
        .close_order(&order.id, OrderStatus::Cancelled)
        .await
        .map_err(sql_error)?;

    if !closed {
        return Err(bad_request(format!(
            "Order {} is {} and can no longer be cancelled",
            order.id, order.status
        )));
    }

    let order = state
        .sql_client
        .get_order(&id)
        .await
        .map_err(sql_error)?
        .ok_or_else(|| not_found(format!("Order {} not found", id)))?;

    info!("Order {} cancelled", order.id);
    ok("Order cancelled", OrderResponse::from(&order))
}

/// Settle an order by hand
pub async fn pay_order(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<PayOrderResponse> {
    let id = path_params(path)?;
    check_uid(&id)?;
    let outcome = state
        .sql_client
        .pay_order(&id, get_utc_datetime())
        .await
        .map_err(sql_error)?;

    let response = match outcome {
        PaymentOutcome::Paid { member_expiry } => PayOrderResponse {
            order_id: id,
            already_paid: false,
            member_expiry: Some(member_expiry),
        },
        PaymentOutcome::AlreadyPaid => PayOrderResponse {
            order_id: id,
            already_paid: true,
            member_expiry: None,
        },
    };

    ok("Order paid", response)
}

/// Check and record one use of the service.
///
/// Answers 403 with the quota details once the daily free uses are spent.
pub async fn check_service(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<(StatusCode, Json<ApiResponse<ServiceCheckResponse>>), ApiError> {
    let access = state
        .sql_client
        .use_service(
            &claims.user_id,
            get_utc_datetime(),
            state.config.daily_free_uses,
        )
        .await
        .map_err(sql_error)?;

    if access.is_allowed() {
        return Ok((
            StatusCode::OK,
            Json(ApiResponse::success(
                "Service access granted",
                ServiceCheckResponse::from(access),
            )),
        ));
    }

    Ok((
        StatusCode::FORBIDDEN,
        Json(ApiResponse {
            code: StatusCode::FORBIDDEN.as_u16(),
            msg: "Daily free uses exhausted, become a member for unlimited access".to_string(),
            data: Some(ServiceCheckResponse::from(access)),
        }),
    ))
}

pub async fn get_member_router(
    prefix: &str,
    app_state: Arc<AppState>,
) -> Result<Router<Arc<AppState>>> {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let public = Router::new().route(&format!("{}/member/cards", prefix), get(list_cards));

        let authenticated = Router::new()
            .route(&format!("{}/member/info", prefix), get(member_info))
            .route(&format!("{}/member/order", prefix), post(create_order))
            .route(&format!("{}/member/orders", prefix), get(list_orders))
            .route(
                &format!("{}/member/order/:id/cancel", prefix),
                post(cancel_order),
            )
            .route(&format!("{}/member/check", prefix), get(check_service))
            .route_layer(middleware::from_fn_with_state(
                app_state.clone(),
                jwt_middleware,
            ));

        let protected = Router::new()
            .route(&format!("{}/member/order/:id/pay", prefix), post(pay_order))
            .route_layer(middleware::from_fn_with_state(
                app_state.clone(),
                rbac_middleware,
            ))
            .route_layer(middleware::from_fn_with_state(app_state, jwt_middleware));

        public.merge(authenticated).merge(protected)
    }));

    match result {
        Ok(router) => Ok(router),
        Err(_) => {
            error!("Failed to create member router");
            Err(anyhow::anyhow!("Failed to create member router"))
                .context("Panic occurred while creating the router")
        }
    }
}
