use chrono::{DateTime, Utc};
use genius_error::UtilError;
use uuid::Uuid;

/// Check if a string is a valid UUIDv4
///
/// # Arguments
///
/// * `uid` - A string slice that holds the UUID
///
/// # Returns
///
/// * `bool` - A boolean indicating if the UUID is version 4
pub fn is_valid_uuid4(uid: &str) -> Result<bool, UtilError> {
    match Uuid::parse_str(uid) {
        Ok(uuid) => Ok(uuid.get_version_num() == 4),
        Err(_) => Err(UtilError::UuidError),
    }
}

pub fn new_uid() -> String {
    Uuid::new_v4().to_string()
}

pub fn get_utc_datetime() -> DateTime<Utc> {
    Utc::now()
}

/// Render an amount in fen as a yuan string with two decimals (998 -> "9.98")
pub fn format_amount(fen: i64) -> String {
    let sign = if fen < 0 { "-" } else { "" };
    let abs = fen.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a yuan string ("9.98", "10", "10.5") into fen
pub fn parse_amount(amount: &str) -> Result<i64, UtilError> {
    let amount = amount.trim();
    let invalid = || UtilError::AmountError(amount.to_string());

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };

    if whole.is_empty()
        || fraction.len() > 2
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole: i64 = whole.parse().map_err(|_| invalid())?;
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction.parse().map_err(|_| invalid())?,
    };

    whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(fraction))
        .ok_or_else(invalid)
}
