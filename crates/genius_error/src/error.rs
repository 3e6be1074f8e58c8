use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Settings Error: {0}")]
    Error(String),
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Logging Error: {0}")]
    Error(String),
}

#[derive(Error, Debug)]
pub enum UtilError {
    #[error("Util Error: {0}")]
    Error(String),

    #[error("Invalid uuid")]
    UuidError,

    #[error("Invalid amount: {0}")]
    AmountError(String),
}

/// Errors raised by the data layer.
///
/// `NotFound` and `Conflict` are surfaced to callers as 404/409, everything
/// else is treated as an internal failure.
#[derive(Error, Debug)]
pub enum SqlError {
    #[error("Failed to connect to database: {0}")]
    ConnectionError(String),

    #[error("Failed to run migrations: {0}")]
    MigrationError(String),

    #[error("Failed to run query: {0}")]
    QueryError(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    Conflict(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Transaction failed: {0}")]
    TransactionError(String),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Failed to encode token: {0}")]
    EncodeError(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error(transparent)]
    SqlError(#[from] SqlError),
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Invalid key: {0}")]
    KeyError(String),

    #[error("Failed to sign request: {0}")]
    SignError(String),

    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Parameter mismatch: {0}")]
    Mismatch(String),

    #[error("Failed to build request: {0}")]
    RequestError(String),
}

#[derive(Error, Debug, serde::Serialize)]
pub enum ServerError {
    #[error("Server failure: {0}")]
    Error(String),

    #[error("Failed to start server: {0}")]
    StartupError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_from_sql_error() {
        let err: AuthError = SqlError::NotFound("user".to_string()).into();
        assert_eq!(err.to_string(), "Record not found: user");
    }
}
