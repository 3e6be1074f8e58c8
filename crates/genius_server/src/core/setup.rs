use anyhow::{Context, Result as AnyhowResult};
use genius_auth::auth::AuthManager;
use genius_logging::logging::setup_logging;
use genius_payment::alipay::AlipayClient;
use genius_settings::config::{BootstrapAdmin, GeniusConfig};
use genius_sql::base::SqlClient;
use genius_sql::enums::client::SqlClientEnum;
use genius_sql::schemas::schema::UserRecord;
use genius_sql::seed::ADMIN_ROLE;
use tracing::{info, warn};

/// Create the configured administrator unless the username is already taken
async fn bootstrap_admin(
    sql_client: &SqlClientEnum,
    auth_manager: &AuthManager,
    admin: &BootstrapAdmin,
) -> AnyhowResult<()> {
    let existing = sql_client
        .get_user_by_username(&admin.username)
        .await
        .context("Failed to look up bootstrap admin")?;

    if existing.is_some() {
        return Ok(());
    }

    let user = UserRecord::new(
        admin.username.clone(),
        auth_manager.hash_password(&admin.password),
        admin.email.clone(),
    );

    sql_client
        .create_user(&user, Some(ADMIN_ROLE))
        .await
        .context("Failed to create bootstrap admin")?;

    info!("Created bootstrap admin {}", admin.username);
    Ok(())
}

/// Connect to the database, migrate, seed reference data and build the
/// payment client. Used by the binary and by tests.
pub async fn initialize(
    config: &GeniusConfig,
) -> AnyhowResult<(SqlClientEnum, Option<AlipayClient>)> {
    let db_settings = config
        .database_settings()
        .context("Invalid database settings")?;

    let sql_client = SqlClientEnum::new(&db_settings)
        .await
        .context("Failed to create sql client")?;

    info!("Sql client: {}", sql_client.name());

    let seeded = sql_client
        .seed_defaults()
        .await
        .context("Failed to seed default data")?;

    info!(
        "Seeded {} permissions, {} roles and {} member cards",
        seeded.permissions, seeded.roles, seeded.member_cards
    );

    if let Some(admin) = &config.bootstrap_admin {
        let auth_manager = AuthManager::new(&config.auth_settings);
        bootstrap_admin(&sql_client, &auth_manager, admin).await?;
    }

    let payment_client = if config.alipay_settings.is_configured() {
        let client = AlipayClient::new(&config.alipay_settings)
            .context("Failed to create Alipay client")?;
        info!("Alipay gateway: {}", client.gateway());
        Some(client)
    } else {
        warn!("Alipay credentials are not configured, payment routes are disabled");
        None
    };

    Ok((sql_client, payment_client))
}

pub async fn setup_components(
) -> AnyhowResult<(GeniusConfig, SqlClientEnum, Option<AlipayClient>)> {
    // setup config
    let config = GeniusConfig::default();

    // start logging
    setup_logging(&config.log_level)
        .await
        .context("Failed to setup logging")?;

    info!("Starting Genius server ({})", config.app_env);

    let (sql_client, payment_client) = initialize(&config).await?;

    Ok((config, sql_client, payment_client))
}
