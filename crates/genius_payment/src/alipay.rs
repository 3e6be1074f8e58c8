use crate::schema::{PagePayContent, TradeNotification};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{Duration, Utc};
use genius_error::PaymentError;
use genius_settings::config::AlipaySettings;
use genius_utils::utils::format_amount;
use jsonwebtoken::{crypto, Algorithm, DecodingKey, EncodingKey};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const PRODUCTION_GATEWAY: &str = "https://openapi.alipay.com/gateway.do";
pub const SANDBOX_GATEWAY: &str = "https://openapi-sandbox.dl.alipaydev.com/gateway.do";

const PAGE_PAY_METHOD: &str = "alipay.trade.page.pay";
const PRODUCT_CODE: &str = "FAST_INSTANT_TRADE_PAY";
const SIGN_TYPE: &str = "RSA2";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Wrap a bare base64 key body in PEM armor, 64 characters per line
fn wrap_pem(key: &str, label: &str) -> String {
    let mut pem = format!("-----BEGIN {}-----\n", label);
    for (i, c) in key.chars().filter(|c| !c.is_whitespace()).enumerate() {
        if i > 0 && i % 64 == 0 {
            pem.push('\n');
        }
        pem.push(c);
    }
    pem.push_str(&format!("\n-----END {}-----\n", label));
    pem
}

/// Load the merchant private key.
///
/// Accepts a PEM document, or the bare base64 body of either a PKCS#8 or a
/// PKCS#1 key as issued by the Alipay console.
pub fn load_private_key(key: &str) -> Result<EncodingKey, PaymentError> {
    let key = key.trim();

    if key.contains("-----BEGIN") {
        return EncodingKey::from_rsa_pem(key.as_bytes())
            .map_err(|e| PaymentError::KeyError(format!("{}", e)));
    }

    EncodingKey::from_rsa_pem(wrap_pem(key, "PRIVATE KEY").as_bytes())
        .or_else(|_| EncodingKey::from_rsa_pem(wrap_pem(key, "RSA PRIVATE KEY").as_bytes()))
        .map_err(|e| PaymentError::KeyError(format!("{}", e)))
}

/// Load the Alipay public key from PEM or a bare base64 SPKI body
pub fn load_public_key(key: &str) -> Result<DecodingKey, PaymentError> {
    let key = key.trim();

    let pem = if key.contains("-----BEGIN") {
        key.to_string()
    } else {
        wrap_pem(key, "PUBLIC KEY")
    };

    DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| PaymentError::KeyError(format!("{}", e)))
}

/// Build the string Alipay signs: non-empty parameters sorted by key, joined
/// as `k=v&k=v`, leaving out `excluded` keys.
pub fn signing_content(params: &BTreeMap<String, String>, excluded: &[&str]) -> String {
    params
        .iter()
        .filter(|(key, value)| !value.is_empty() && !excluded.contains(&key.as_str()))
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<String>>()
        .join("&")
}

#[derive(Clone)]
pub struct AlipayClient {
    app_id: String,
    gateway: &'static str,
    notify_url: String,
    return_url: String,
    private_key: EncodingKey,
    public_key: DecodingKey,
}

impl AlipayClient {
    pub fn new(settings: &AlipaySettings) -> Result<Self, PaymentError> {
        if !settings.is_configured() {
            return Err(PaymentError::KeyError(
                "Alipay app id and keys are not configured".to_string(),
            ));
        }

        Ok(Self {
            app_id: settings.app_id.clone(),
            gateway: if settings.is_production {
                PRODUCTION_GATEWAY
            } else {
                SANDBOX_GATEWAY
            },
            notify_url: settings.notify_url.clone(),
            return_url: settings.return_url.clone(),
            private_key: load_private_key(&settings.private_key)?,
            public_key: load_public_key(&settings.public_key)?,
        })
    }

    pub fn gateway(&self) -> &str {
        self.gateway
    }

    /// Sign `content` with SHA256withRSA, returning standard base64
    pub fn sign_content(&self, content: &str) -> Result<String, PaymentError> {
        let signature = crypto::sign(content.as_bytes(), &self.private_key, Algorithm::RS256)
            .map_err(|e| PaymentError::SignError(format!("{}", e)))?;

        let raw = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|e| PaymentError::SignError(format!("{}", e)))?;

        Ok(STANDARD.encode(raw))
    }

    /// Sign every non-empty parameter except `sign`
    pub fn sign_params(&self, params: &BTreeMap<String, String>) -> Result<String, PaymentError> {
        self.sign_content(&signing_content(params, &["sign"]))
    }

    pub fn verify_content(&self, content: &str, signature: &str) -> Result<(), PaymentError> {
        let raw = STANDARD
            .decode(signature.trim())
            .map_err(|_| PaymentError::InvalidSignature)?;

        let valid = crypto::verify(
            &URL_SAFE_NO_PAD.encode(raw),
            content.as_bytes(),
            &self.public_key,
            Algorithm::RS256,
        )
        .map_err(|_| PaymentError::InvalidSignature)?;

        if valid {
            Ok(())
        } else {
            Err(PaymentError::InvalidSignature)
        }
    }

    /// Verify parameters sent by Alipay. `sign` and `sign_type` are not part
    /// of the signed content.
    pub fn verify_params(&self, params: &BTreeMap<String, String>) -> Result<(), PaymentError> {
        let signature = params
            .get("sign")
            .filter(|sign| !sign.is_empty())
            .ok_or_else(|| PaymentError::MissingParameter("sign".to_string()))?;

        self.verify_content(&signing_content(params, &["sign", "sign_type"]), signature)
    }

    /// Verify a notification or return and extract the trade details
    pub fn verify_notification(
        &self,
        params: &BTreeMap<String, String>,
    ) -> Result<TradeNotification, PaymentError> {
        self.verify_params(params)?;

        if let Some(app_id) = params.get("app_id") {
            if app_id != &self.app_id {
                warn!("Alipay callback for unexpected app id {}", app_id);
                return Err(PaymentError::Mismatch(format!("app_id {}", app_id)));
            }
        }

        TradeNotification::from_params(params)
    }

    /// Signed parameters of an `alipay.trade.page.pay` request
    pub fn page_pay_params(
        &self,
        order_id: &str,
        amount: i64,
        subject: &str,
        timestamp: &str,
    ) -> Result<BTreeMap<String, String>, PaymentError> {
        let biz_content = serde_json::to_string(&PagePayContent {
            out_trade_no: order_id,
            total_amount: format_amount(amount),
            subject,
            product_code: PRODUCT_CODE,
        })
        .map_err(|e| PaymentError::RequestError(format!("{}", e)))?;

        let mut params: BTreeMap<String, String> = [
            ("app_id", self.app_id.as_str()),
            ("method", PAGE_PAY_METHOD),
            ("format", "JSON"),
            ("charset", "utf-8"),
            ("sign_type", SIGN_TYPE),
            ("timestamp", timestamp),
            ("version", "1.0"),
            ("notify_url", self.notify_url.as_str()),
            ("return_url", self.return_url.as_str()),
            ("biz_content", biz_content.as_str()),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

        let sign = self.sign_params(&params)?;
        params.insert("sign".to_string(), sign);

        Ok(params)
    }

    /// Build the URL the buyer is redirected to for paying an order
    ///
    /// # Arguments
    ///
    /// * `order_id` - Used as `out_trade_no`
    /// * `amount` - Order amount in fen
    /// * `subject` - Title shown on the cashier page
    pub fn page_pay_url(
        &self,
        order_id: &str,
        amount: i64,
        subject: &str,
    ) -> Result<String, PaymentError> {
        // Alipay expects Beijing time
        let timestamp = (Utc::now() + Duration::hours(8))
            .format(TIMESTAMP_FORMAT)
            .to_string();

        let params = self.page_pay_params(order_id, amount, subject, &timestamp)?;
        let query = serde_urlencoded::to_string(&params)
            .map_err(|e| PaymentError::RequestError(format!("{}", e)))?;

        debug!("Created page pay request for order {}", order_id);

        Ok(format!("{}?{}", self.gateway, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_PRIVATE_PKCS1: &str = include_str!("../fixtures/app_private_pkcs1.pem");
    const APP_PRIVATE_PKCS8: &str = include_str!("../fixtures/app_private_pkcs8.pem");
    const APP_PUBLIC: &str = include_str!("../fixtures/app_public.pem");
    const ALIPAY_PRIVATE: &str = include_str!("../fixtures/alipay_private.pem");
    const ALIPAY_PUBLIC: &str = include_str!("../fixtures/alipay_public.pem");
    const KNOWN_ANSWER: &str = include_str!("../fixtures/known_answer.sig");

    /// The base64 body of a PEM document, as pasted from the Alipay console
    fn strip_armor(pem: &str) -> String {
        pem.lines()
            .filter(|line| !line.starts_with("-----"))
            .collect::<Vec<&str>>()
            .join("")
    }

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn client(private_key: &str, public_key: &str) -> AlipayClient {
        AlipayClient::new(&AlipaySettings {
            app_id: "2021000000000001".to_string(),
            private_key: private_key.to_string(),
            public_key: public_key.to_string(),
            notify_url: "https://example.com/api/v1/payment/notify".to_string(),
            return_url: "https://example.com/api/v1/payment/return".to_string(),
            is_production: false,
        })
        .unwrap()
    }

    #[test]
    fn test_wrap_pem() {
        let body = "A".repeat(130);
        let pem = wrap_pem(&body, "PUBLIC KEY");
        let lines: Vec<&str> = pem.lines().collect();
        assert_eq!(lines[0], "-----BEGIN PUBLIC KEY-----");
        assert_eq!(lines[1].len(), 64);
        assert_eq!(lines[2].len(), 64);
        assert_eq!(lines[3].len(), 2);
        assert_eq!(lines[4], "-----END PUBLIC KEY-----");
    }

    #[test]
    fn test_load_keys() {
        assert!(load_private_key(APP_PRIVATE_PKCS1).is_ok());
        assert!(load_private_key(APP_PRIVATE_PKCS8).is_ok());
        assert!(load_private_key(&strip_armor(APP_PRIVATE_PKCS1)).is_ok());
        assert!(load_private_key(&strip_armor(APP_PRIVATE_PKCS8)).is_ok());
        assert!(load_public_key(APP_PUBLIC).is_ok());
        assert!(load_public_key(&strip_armor(APP_PUBLIC)).is_ok());
        assert!(load_private_key("not a key").is_err());
    }

    #[test]
    fn test_unconfigured_client() {
        assert!(AlipayClient::new(&AlipaySettings::default()).is_err());
    }

    #[test]
    fn test_signing_content() {
        let params = params(&[
            ("b", "2"),
            ("a", "1"),
            ("empty", ""),
            ("sign", "xyz"),
            ("sign_type", "RSA2"),
        ]);
        assert_eq!(signing_content(&params, &["sign"]), "a=1&b=2&sign_type=RSA2");
        assert_eq!(signing_content(&params, &["sign", "sign_type"]), "a=1&b=2");
    }

    #[test]
    fn test_known_answer_signature() {
        // produced with: openssl dgst -sha256 -sign app_private_pkcs1.pem | base64
        let params = params(&[("c", "hello"), ("a", "1"), ("b", "2"), ("d", "")]);
        let expected = KNOWN_ANSWER.trim();

        let pkcs1 = client(APP_PRIVATE_PKCS1, APP_PUBLIC);
        assert_eq!(pkcs1.sign_params(&params).unwrap(), expected);

        // the same key in PKCS#8 form signs identically
        let pkcs8 = client(&strip_armor(APP_PRIVATE_PKCS8), &strip_armor(APP_PUBLIC));
        assert_eq!(pkcs8.sign_params(&params).unwrap(), expected);

        assert!(pkcs1.verify_content("a=1&b=2&c=hello", expected).is_ok());
    }

    #[test]
    fn test_verify_notification() {
        let alipay = client(ALIPAY_PRIVATE, APP_PUBLIC);
        let merchant = client(APP_PRIVATE_PKCS1, ALIPAY_PUBLIC);

        let mut notification = params(&[
            ("app_id", "2021000000000001"),
            ("out_trade_no", "order-1"),
            ("trade_no", "2025030122001"),
            ("trade_status", "TRADE_SUCCESS"),
            ("total_amount", "29.98"),
        ]);
        let sign = alipay.sign_params(&notification).unwrap();
        notification.insert("sign".to_string(), sign);
        notification.insert("sign_type".to_string(), "RSA2".to_string());

        let verified = merchant.verify_notification(&notification).unwrap();
        assert_eq!(verified.out_trade_no, "order-1");
        assert_eq!(verified.total_amount, Some(2998));
        assert!(verified.trade_status.is_paid());

        let mut tampered = notification.clone();
        tampered.insert("total_amount".to_string(), "0.01".to_string());
        assert!(matches!(
            merchant.verify_notification(&tampered),
            Err(PaymentError::InvalidSignature)
        ));

        let mut unsigned = notification.clone();
        unsigned.remove("sign");
        assert!(matches!(
            merchant.verify_notification(&unsigned),
            Err(PaymentError::MissingParameter(_))
        ));

        // signed by someone other than alipay
        let mut forged = notification;
        let sign = merchant.sign_content("anything").unwrap();
        forged.insert("sign".to_string(), sign);
        assert!(merchant.verify_notification(&forged).is_err());
    }

    #[test]
    fn test_page_pay_url() {
        let client = client(APP_PRIVATE_PKCS1, APP_PUBLIC);
        let url = client.page_pay_url("order-1", 2998, "Week card").unwrap();
        assert!(url.starts_with(SANDBOX_GATEWAY));

        let (_, query) = url.split_once('?').unwrap();
        let parsed: BTreeMap<String, String> = serde_urlencoded::from_str(query).unwrap();
        assert_eq!(parsed["method"], "alipay.trade.page.pay");
        assert_eq!(parsed["sign_type"], "RSA2");
        assert_eq!(parsed["charset"], "utf-8");
        assert_eq!(parsed["timestamp"].len(), 19);

        let biz: serde_json::Value = serde_json::from_str(&parsed["biz_content"]).unwrap();
        assert_eq!(biz["out_trade_no"], "order-1");
        assert_eq!(biz["total_amount"], "29.98");
        assert_eq!(biz["product_code"], "FAST_INSTANT_TRADE_PAY");

        // request signatures cover sign_type
        let content = signing_content(&parsed, &["sign"]);
        assert!(client.verify_content(&content, &parsed["sign"]).is_ok());
    }

    #[test]
    fn test_page_pay_params_are_deterministic() {
        let client = client(APP_PRIVATE_PKCS1, APP_PUBLIC);
        let first = client
            .page_pay_params("order-1", 998, "Day card", "2025-03-01 12:00:00")
            .unwrap();
        let second = client
            .page_pay_params("order-1", 998, "Day card", "2025-03-01 12:00:00")
            .unwrap();
        assert_eq!(first["sign"], second["sign"]);
        assert_eq!(first["timestamp"], "2025-03-01 12:00:00");
    }
}
