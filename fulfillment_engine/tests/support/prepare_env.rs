use fulfillment_engine::{
    db_types::{Money, NewProduct},
    FulfillmentDatabase,
    InventoryManagement,
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

/// Creates a fresh database at `url`, runs the migrations and seeds the default test catalog.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 25).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    db.seed_products(&test_catalog()).await.expect("Error seeding products");
    db
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/sf_test_store_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn create_database(url: &str) {
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        if let Err(e) = Sqlite::drop_database(url).await {
            warn!("Error dropping database {url}: {e:?}");
        }
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

pub async fn drop_database(db: SqliteDatabase) {
    let url = db.url().to_string();
    db.pool().close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
}

/// | id  | name    | price | stock |
/// |-----|---------|-------|-------|
/// | mug | Mug     | 12.00 | 5     |
/// | tee | T-shirt | 20.00 | 10    |
/// | pin | Pin     |  1.50 | 1     |
pub fn test_catalog() -> Vec<NewProduct> {
    vec![
        NewProduct::new("mug", "Mug", Money::from(1200), 5),
        NewProduct::new("tee", "T-shirt", Money::from(2000), 10),
        NewProduct::new("pin", "Pin", Money::from(150), 1),
    ]
}

pub async fn stock_of<B: InventoryManagement>(db: &B, product_id: &str) -> i64 {
    db.fetch_product(product_id).await.expect("Error fetching product").expect("Product does not exist").stock
}

pub async fn order_count(db: &SqliteDatabase) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(db.pool()).await.expect("Error counting orders")
}

pub async fn order_count_with_status(db: &SqliteDatabase, status: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = $1")
        .bind(status)
        .fetch_one(db.pool())
        .await
        .expect("Error counting orders")
}
