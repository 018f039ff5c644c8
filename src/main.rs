use chrono::Local;
use dotenvy::dotenv;
use stock_ledger::{
    config::{self, database},
    core::inventory::InventoryService,
    errors::Result,
    models::BucketKey,
    store::SeaOrmLedgerStore,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the main application configuration
    let app_config = config::load_default_config()
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;
    info!(
        "Using master sheet {:?}, lock timeout {} minutes",
        app_config.ledger.master_sheet, app_config.locks.timeout_minutes
    );

    // 4. Connect and make sure the ledger tables exist
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Summarize today's count
    let service = InventoryService::new(SeaOrmLedgerStore::new(db), &app_config);
    let today = Local::now().date_naive();
    let view = service
        .get_snapshot(Some(today))
        .await
        .inspect_err(|e| error!("Failed to read snapshot for {}: {}", today, e))?;

    info!(
        "{} for {}: {} buckets",
        if view.existing_inventory {
            "Saved count"
        } else {
            "Template"
        },
        today,
        view.snapshot.buckets.len()
    );
    for bucket in &view.snapshot.buckets {
        let counted = bucket
            .entries
            .iter()
            .filter(|e| !e.current_quantity.is_empty())
            .count();
        match &bucket.key {
            BucketKey::Location(id) => info!(
                "Location {}: {} products, {} counted",
                id,
                bucket.entries.len(),
                counted
            ),
            BucketKey::Unassigned => info!("Unassigned: {} products", bucket.entries.len()),
        }
    }

    Ok(())
}
