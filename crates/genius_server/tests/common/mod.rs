#![allow(dead_code)]

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use genius_payment::alipay::AlipayClient;
use genius_server::core::router::create_router;
use genius_server::core::setup::initialize;
use genius_server::core::state::AppState;
use genius_settings::config::{AlipaySettings, AuthSettings, BootstrapAdmin, GeniusConfig};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt;

const APP_PRIVATE: &str = include_str!("../../../genius_payment/fixtures/app_private_pkcs1.pem");
const APP_PUBLIC: &str = include_str!("../../../genius_payment/fixtures/app_public.pem");
const ALIPAY_PRIVATE: &str = include_str!("../../../genius_payment/fixtures/alipay_private.pem");
const ALIPAY_PUBLIC: &str = include_str!("../../../genius_payment/fixtures/alipay_public.pem");

pub const APP_ID: &str = "2021000000000001";
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const SUCCESS_URL: &str = "/payment/success";

fn alipay_settings(private_key: &str, public_key: &str) -> AlipaySettings {
    AlipaySettings {
        app_id: APP_ID.to_string(),
        private_key: private_key.to_string(),
        public_key: public_key.to_string(),
        notify_url: "http://localhost/api/v1/payment/notify".to_string(),
        return_url: "http://localhost/api/v1/payment/return".to_string(),
        is_production: false,
    }
}

fn test_config(with_payment: bool) -> GeniusConfig {
    GeniusConfig {
        database_uri: "sqlite::memory:".to_string(),
        max_connections: 1,
        auth_settings: AuthSettings {
            jwt_secret: "integration-secret".to_string(),
            jwt_expiry_hours: 24,
            jwt_issuer: "genius".to_string(),
        },
        alipay_settings: if with_payment {
            alipay_settings(APP_PRIVATE, ALIPAY_PUBLIC)
        } else {
            AlipaySettings::default()
        },
        daily_free_uses: 1,
        payment_success_url: SUCCESS_URL.to_string(),
        bootstrap_admin: Some(BootstrapAdmin {
            username: ADMIN_USERNAME.to_string(),
            password: ADMIN_PASSWORD.to_string(),
            email: "admin@example.com".to_string(),
        }),
        ..Default::default()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap_or(Value::Null)
    }
}

pub struct TestHelper {
    pub app: Router,
    pub admin_token: String,
    /// Plays the gateway: signs callbacks with the Alipay key
    pub gateway: AlipayClient,
}

impl TestHelper {
    pub async fn new() -> Self {
        Self::with_config(test_config(true)).await
    }

    pub async fn without_payment() -> Self {
        Self::with_config(test_config(false)).await
    }

    async fn with_config(config: GeniusConfig) -> Self {
        let (sql_client, payment_client) = initialize(&config).await.unwrap();
        let app_state = Arc::new(AppState::new(config, sql_client, payment_client));
        let app = create_router(app_state).await.unwrap();
        let gateway = AlipayClient::new(&alipay_settings(ALIPAY_PRIVATE, APP_PUBLIC)).unwrap();

        let mut helper = TestHelper {
            app,
            admin_token: String::new(),
            gateway,
        };

        let (_, token) = helper.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;
        helper.admin_token = token;
        helper
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            headers,
            text: String::from_utf8_lossy(&bytes).to_string(),
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.send(request).await;
        (response.status, response.json())
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    /// Register a user, returning `(id, token)`
    pub async fn register(&self, username: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/api/v1/users/register",
                None,
                json!({
                    "username": username,
                    "password": format!("{}-password", username),
                    "email": format!("{}@example.com", username),
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);

        (
            body["data"]["id"].as_str().unwrap().to_string(),
            body["data"]["token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn login(&self, username: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/api/v1/users/login",
                None,
                json!({ "username": username, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);

        (
            body["data"]["id"].as_str().unwrap().to_string(),
            body["data"]["token"].as_str().unwrap().to_string(),
        )
    }

    /// Seeded card id by duration in days
    pub async fn card_id(&self, duration_days: i64) -> i64 {
        let (_, body) = self.get("/api/v1/member/cards", None).await;
        body["data"]["cards"]
            .as_array()
            .unwrap()
            .iter()
            .find(|card| card["duration_days"].as_i64() == Some(duration_days))
            .and_then(|card| card["id"].as_i64())
            .unwrap()
    }

    /// Callback parameters signed the way the gateway signs them
    pub fn signed_params(&self, pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        let mut params: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.insert("app_id".to_string(), APP_ID.to_string());

        let sign = self.gateway.sign_params(&params).unwrap();
        params.insert("sign".to_string(), sign);
        params.insert("sign_type".to_string(), "RSA2".to_string());
        params
    }

    pub async fn notify(&self, params: &BTreeMap<String, String>) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/payment/notify")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(serde_urlencoded::to_string(params).unwrap()))
            .unwrap();

        self.send(request).await
    }
}
