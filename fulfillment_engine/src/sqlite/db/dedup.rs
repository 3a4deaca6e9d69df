use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{DedupRecord, OrderId};

/// Claims the idempotency key. Returns `false` if the key has already been claimed, in which case nothing is written.
///
/// Call this as the first statement of the fulfilment transaction. A concurrent claim of the same key then blocks
/// until this transaction finishes, and sees the key as taken if it commits.
pub async fn claim_key(key: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("INSERT INTO fulfillment_keys (idempotency_key) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(key)
        .execute(conn)
        .await?;
    let claimed = result.rows_affected() == 1;
    trace!("🗃️ Idempotency key {key} claimed: {claimed}");
    Ok(claimed)
}

pub async fn bind_order(key: &str, order_id: OrderId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE fulfillment_keys SET order_id = $1 WHERE idempotency_key = $2")
        .bind(order_id.value())
        .bind(key)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_record(key: &str, conn: &mut SqliteConnection) -> Result<Option<DedupRecord>, sqlx::Error> {
    let record =
        sqlx::query_as("SELECT idempotency_key, order_id, applied_at FROM fulfillment_keys WHERE idempotency_key = $1")
            .bind(key)
            .fetch_optional(conn)
            .await?;
    Ok(record)
}
