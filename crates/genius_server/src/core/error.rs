use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use genius_contracts::ApiResponse;
use genius_error::{AuthError, PaymentError, SqlError};
use genius_utils::utils::is_valid_uuid4;
use std::fmt::Display;
use tracing::error;
use validator::Validate;

pub type ApiError = (StatusCode, Json<ApiResponse<()>>);
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(msg: &str, data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(msg, data)))
}

pub fn error_response(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(ApiResponse::error(status.as_u16(), msg)))
}

pub fn bad_request(msg: impl Into<String>) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, msg)
}

pub fn unauthorized(msg: impl Into<String>) -> ApiError {
    error_response(StatusCode::UNAUTHORIZED, msg)
}

pub fn forbidden(msg: impl Into<String>) -> ApiError {
    error_response(StatusCode::FORBIDDEN, msg)
}

pub fn not_found(msg: impl Into<String>) -> ApiError {
    error_response(StatusCode::NOT_FOUND, msg)
}

/// Log the cause and answer with a generic 500
pub fn internal_server_error<E: Display>(e: E) -> ApiError {
    error!("Internal server error: {}", e);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

pub fn sql_error(e: SqlError) -> ApiError {
    match e {
        SqlError::NotFound(_) => not_found(e.to_string()),
        SqlError::Conflict(_) => error_response(StatusCode::CONFLICT, e.to_string()),
        SqlError::InvalidRecord(_) => bad_request(e.to_string()),
        _ => internal_server_error(e),
    }
}

pub fn auth_error(e: AuthError) -> ApiError {
    match e {
        AuthError::InvalidCredentials | AuthError::InvalidToken(_) => unauthorized(e.to_string()),
        AuthError::SqlError(e) => sql_error(e),
        _ => internal_server_error(e),
    }
}

pub fn payment_error(e: PaymentError) -> ApiError {
    match e {
        PaymentError::InvalidSignature
        | PaymentError::MissingParameter(_)
        | PaymentError::Mismatch(_) => bad_request(e.to_string()),
        _ => internal_server_error(e),
    }
}

/// Unwrap a JSON body and run its validation rules
pub fn validated<T: Validate>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(body) = payload.map_err(|rejection| bad_request(rejection.body_text()))?;
    body.validate().map_err(|e| bad_request(e.to_string()))?;
    Ok(body)
}

/// Unwrap path parameters, answering 400 when a segment does not parse
pub fn path_params<T>(path: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    let Path(params) = path.map_err(|rejection| bad_request(rejection.body_text()))?;
    Ok(params)
}

/// Unwrap query parameters, answering 400 when the query string does not parse
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    let Query(params) = query.map_err(|rejection| bad_request(rejection.body_text()))?;
    Ok(params)
}

/// User, permission and order ids are UUIDv4 strings
pub fn check_uid(id: &str) -> Result<(), ApiError> {
    match is_valid_uuid4(id) {
        Ok(true) => Ok(()),
        _ => Err(bad_request(format!("Invalid id {}", id))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_error_status() {
        assert_eq!(
            sql_error(SqlError::NotFound("user".to_string())).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            sql_error(SqlError::Conflict("users.username".to_string())).0,
            StatusCode::CONFLICT
        );

        let (status, Json(body)) = sql_error(SqlError::QueryError("syntax error".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, 500);
        assert!(!body.msg.contains("syntax"));
    }

    #[test]
    fn test_auth_error_status() {
        assert_eq!(
            auth_error(AuthError::InvalidCredentials).0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            auth_error(AuthError::SqlError(SqlError::NotFound("user".to_string()))).0,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_check_uid() {
        assert!(check_uid(&genius_utils::utils::new_uid()).is_ok());

        let (status, Json(body)) = check_uid("not-a-uuid").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, 400);

        // well formed but not version 4
        assert!(check_uid("00000000-0000-1000-8000-000000000000").is_err());
    }

    #[test]
    fn test_payment_error_status() {
        assert_eq!(
            payment_error(PaymentError::InvalidSignature).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            payment_error(PaymentError::SignError("bad key".to_string())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
