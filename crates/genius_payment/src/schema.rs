use genius_error::PaymentError;
use genius_utils::utils::parse_amount;
use serde::Serialize;
use std::collections::BTreeMap;

/// Trade states reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeStatus {
    WaitBuyerPay,
    Success,
    Finished,
    Closed,
    Unknown,
}

impl TradeStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "WAIT_BUYER_PAY" => TradeStatus::WaitBuyerPay,
            "TRADE_SUCCESS" => TradeStatus::Success,
            "TRADE_FINISHED" => TradeStatus::Finished,
            "TRADE_CLOSED" => TradeStatus::Closed,
            _ => TradeStatus::Unknown,
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, TradeStatus::Success | TradeStatus::Finished)
    }
}

/// `biz_content` of `alipay.trade.page.pay`
#[derive(Debug, Serialize)]
pub struct PagePayContent<'a> {
    pub out_trade_no: &'a str,
    pub total_amount: String,
    pub subject: &'a str,
    pub product_code: &'a str,
}

/// A verified asynchronous notification or synchronous return
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeNotification {
    pub out_trade_no: String,
    pub trade_no: Option<String>,
    pub trade_status: TradeStatus,
    /// fen, `None` when the gateway did not report an amount (sync return)
    pub total_amount: Option<i64>,
}

impl TradeNotification {
    pub fn from_params(params: &BTreeMap<String, String>) -> Result<Self, PaymentError> {
        let out_trade_no = params
            .get("out_trade_no")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| PaymentError::MissingParameter("out_trade_no".to_string()))?
            .clone();

        let total_amount = match params.get("total_amount").filter(|v| !v.is_empty()) {
            Some(amount) => Some(
                parse_amount(amount).map_err(|e| PaymentError::RequestError(e.to_string()))?,
            ),
            None => None,
        };

        Ok(TradeNotification {
            out_trade_no,
            trade_no: params.get("trade_no").cloned(),
            trade_status: TradeStatus::parse(
                params.get("trade_status").map(String::as_str).unwrap_or(""),
            ),
            total_amount,
        })
    }
}
