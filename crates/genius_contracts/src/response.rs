use serde::{Deserialize, Serialize};

/// Envelope wrapped around every JSON response.
///
/// `code` mirrors the HTTP status, `data` is `null` on errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(msg: impl Into<String>, data: T) -> Self {
        ApiResponse {
            code: 200,
            msg: msg.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(code: u16, msg: impl Into<String>) -> Self {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub list: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// `?page=&limit=` query parameters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let ok = serde_json::to_value(ApiResponse::success("ok", 5)).unwrap();
        assert_eq!(ok, serde_json::json!({"code": 200, "msg": "ok", "data": 5}));

        let err = serde_json::to_value(ApiResponse::error(404, "missing")).unwrap();
        assert_eq!(
            err,
            serde_json::json!({"code": 404, "msg": "missing", "data": null})
        );
    }
}
