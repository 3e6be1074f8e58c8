use crate::core::auth::middleware::jwt_middleware;
use crate::core::error::{
    bad_request, error_response, ok, payment_error, query_params, sql_error, validated, ApiError,
    ApiResult,
};
use crate::core::member::route::{load_card, place_order};
use crate::core::state::AppState;
use anyhow::{Context, Result};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{
    middleware,
    routing::{get, post},
    Extension, Form, Json, Router,
};
use genius_auth::schema::Claims;
use genius_contracts::payment::{PaymentRequest, PaymentResponse};
use genius_payment::alipay::AlipayClient;
use genius_payment::schema::{TradeNotification, TradeStatus};
use genius_sql::base::SqlClient;
use genius_sql::schemas::schema::{OrderStatus, PaymentOutcome};
use genius_utils::utils::get_utc_datetime;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info, warn};

const NOTIFY_SUCCESS: &str = "success";
const NOTIFY_FAIL: &str = "fail";

fn payment_client(state: &AppState) -> Result<&AlipayClient, ApiError> {
    state.payment_client.as_ref().ok_or_else(|| {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Payment gateway is not configured",
        )
    })
}

/// Settle the order named by a verified gateway callback
async fn settle(state: &AppState, notification: &TradeNotification) -> Result<(), ApiError> {
    let order = state
        .sql_client
        .get_order(&notification.out_trade_no)
        .await
        .map_err(sql_error)?
        .ok_or_else(|| bad_request(format!("Unknown order {}", notification.out_trade_no)))?;

    if let Some(amount) = notification.total_amount {
        if amount != order.amount {
            warn!(
                "Amount mismatch for order {}: paid {} fen, expected {} fen",
                order.id, amount, order.amount
            );
            return Err(bad_request("Paid amount does not match the order"));
        }
    }

    match state
        .sql_client
        .pay_order(&order.id, get_utc_datetime())
        .await
        .map_err(sql_error)?
    {
        PaymentOutcome::Paid { member_expiry } => {
            info!(
                "Order {} paid, membership of user {} runs until {}",
                order.id, order.user_id, member_expiry
            );
        }
        PaymentOutcome::AlreadyPaid => {
            info!("Order {} was already paid", order.id);
        }
    }

    Ok(())
}

/// Place an order for a card and return the Alipay cashier URL
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> ApiResult<PaymentResponse> {
    let client = payment_client(&state)?;
    let request = validated(payload)?;

    let card = load_card(&state, request.card_id).await?;
    let order = place_order(&state, &claims.user_id, &card).await?;

    let pay_url = client
        .page_pay_url(&order.id, order.amount, &card.name)
        .map_err(payment_error)?;

    ok(
        "Payment created",
        PaymentResponse {
            order_id: order.id,
            pay_url,
        },
    )
}

async fn handle_notification(
    state: &AppState,
    params: &BTreeMap<String, String>,
) -> Result<(), ApiError> {
    let notification = payment_client(state)?
        .verify_notification(params)
        .map_err(payment_error)?;

    match notification.trade_status {
        status if status.is_paid() => settle(state, &notification).await,
        TradeStatus::Closed => {
            let closed = state
                .sql_client
                .close_order(&notification.out_trade_no, OrderStatus::Failed)
                .await
                .map_err(sql_error)?;

            if closed {
                info!("Order {} closed by the gateway", notification.out_trade_no);
            }
            Ok(())
        }
        status => {
            info!(
                "Ignoring {:?} notification for order {}",
                status, notification.out_trade_no
            );
            Ok(())
        }
    }
}

/// Asynchronous notification from Alipay.
///
/// Alipay keeps retrying until the body is exactly `success`.
pub async fn payment_notify(
    State(state): State<Arc<AppState>>,
    Form(params): Form<BTreeMap<String, String>>,
) -> (StatusCode, &'static str) {
    if state.payment_client.is_none() {
        return (StatusCode::SERVICE_UNAVAILABLE, NOTIFY_FAIL);
    }

    match handle_notification(&state, &params).await {
        Ok(()) => (StatusCode::OK, NOTIFY_SUCCESS),
        Err((status, body)) => {
            warn!("Rejected payment notification ({}): {}", status, body.msg);
            (StatusCode::OK, NOTIFY_FAIL)
        }
    }
}

/// Browser return from the cashier page
pub async fn payment_return(
    State(state): State<Arc<AppState>>,
    query: Result<Query<BTreeMap<String, String>>, QueryRejection>,
) -> Result<Response, ApiError> {
    let params = query_params(query)?;
    let notification = payment_client(&state)?
        .verify_notification(&params)
        .map_err(payment_error)?;

    settle(&state, &notification).await?;

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, state.config.payment_success_url.clone())],
    )
        .into_response())
}

pub async fn get_payment_router(
    prefix: &str,
    app_state: Arc<AppState>,
) -> Result<Router<Arc<AppState>>> {
    let result = catch_unwind(AssertUnwindSafe(|| {
        // callbacks are authenticated by the gateway signature
        let callbacks = Router::new()
            .route(&format!("{}/payment/notify", prefix), post(payment_notify))
            .route(&format!("{}/payment/return", prefix), get(payment_return));

        let authenticated = Router::new()
            .route(&format!("{}/payment/create", prefix), post(create_payment))
            .route_layer(middleware::from_fn_with_state(app_state, jwt_middleware));

        callbacks.merge(authenticated)
    }));

    match result {
        Ok(router) => Ok(router),
        Err(_) => {
            error!("Failed to create payment router");
            Err(anyhow::anyhow!("Failed to create payment router"))
                .context("Panic occurred while creating the router")
        }
    }
}
