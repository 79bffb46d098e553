//! GreenMarket Server: Application entry point.

use gm_db::repository::{
    SurrealAccountRepository, SurrealOrderRepository, SurrealProductRepository,
};
use gm_db::{DbConfig, DbManager};
use gm_market::{
    AccountService, CatalogService, CheckoutService, MarketConfig, NotificationService,
    RandomCodeGenerator, VendorService,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("gm=info".parse()?))
        .json()
        .init();

    tracing::info!("Starting GreenMarket server...");

    let env = |key: &str| std::env::var(key).ok();
    let db_config = DbConfig::default().overlay(env);
    let market_config = MarketConfig::default().overlay(env);

    let manager = DbManager::connect(&db_config).await?;
    let db = manager.client().clone();
    gm_db::run_migrations(&db).await?;
    tracing::info!(
        schema_version = gm_db::latest_version(),
        "Schema up to date"
    );

    let accounts = SurrealAccountRepository::new(db.clone());
    let products = SurrealProductRepository::new(db.clone());
    let orders = SurrealOrderRepository::new(db);

    let _accounts = AccountService::new(accounts.clone());
    let _vendors = VendorService::new(accounts.clone(), RandomCodeGenerator, market_config.clone());
    let _catalog = CatalogService::new(products.clone(), accounts.clone());
    let _checkout = CheckoutService::new(products, orders, accounts.clone(), market_config);
    let _notifications = NotificationService::new(accounts);

    // TODO: expose the services over HTTP once the storefront API is defined.
    tracing::info!("Services ready; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    tracing::info!("GreenMarket server stopped.");
    Ok(())
}
