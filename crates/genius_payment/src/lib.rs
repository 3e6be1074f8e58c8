pub mod alipay;
pub mod schema;
