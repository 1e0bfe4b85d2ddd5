use dotenvy::dotenv;
use pos_ledger::{
    config::{
        catalog::{catalog_path, load_catalog},
        database::{create_connection, create_tables},
        store::StoreSettings,
    },
    core::{product::seed_catalog, report},
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    let settings = StoreSettings::from_env();
    info!("Starting ledger for {}", settings.name);

    // 3. Connect and make sure the schema exists
    let db = create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 4. Seed the catalog, if one is configured
    let path = catalog_path();
    if path.exists() {
        let catalog = load_catalog(&path)?;
        let created = seed_catalog(&db, &catalog)
            .await
            .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;
        info!("Seeded {} new products from {}", created, path.display());
    } else {
        info!("No catalog at {}, skipping seeding", path.display());
    }

    // 5. Report where the store stands
    let summary = report::get_sales_summary(&db, chrono::Utc::now()).await?;
    info!(
        "Sales today: {}, this month: {}",
        report::format_currency(summary.today, &settings.currency_symbol),
        report::format_currency(summary.month, &settings.currency_symbol)
    );

    Ok(())
}
