use genius_auth::auth::AuthManager;
use genius_payment::alipay::AlipayClient;
use genius_settings::config::GeniusConfig;
use genius_sql::enums::client::SqlClientEnum;
use std::sync::Arc;

pub struct AppState {
    pub sql_client: Arc<SqlClientEnum>,
    pub auth_manager: AuthManager,
    pub config: Arc<GeniusConfig>,
    /// `None` when no Alipay credentials are configured
    pub payment_client: Option<AlipayClient>,
}

impl AppState {
    pub fn new(
        config: GeniusConfig,
        sql_client: SqlClientEnum,
        payment_client: Option<AlipayClient>,
    ) -> Self {
        Self {
            sql_client: Arc::new(sql_client),
            auth_manager: AuthManager::new(&config.auth_settings),
            config: Arc::new(config),
            payment_client,
        }
    }
}
