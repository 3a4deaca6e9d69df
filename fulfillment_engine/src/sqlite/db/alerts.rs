use log::warn;
use sqlx::SqliteConnection;

use crate::db_types::{NewReconciliationAlert, ReconciliationAlert};

const ALERT_COLUMNS: &str = "id, kind, email, reference, details, created_at";

pub async fn insert_alert(
    alert: NewReconciliationAlert,
    conn: &mut SqliteConnection,
) -> Result<ReconciliationAlert, sqlx::Error> {
    let alert: ReconciliationAlert = sqlx::query_as(&format!(
        r#"
            INSERT INTO reconciliation_alerts (kind, email, reference, details)
            VALUES ($1, $2, $3, $4)
            RETURNING {ALERT_COLUMNS};
        "#
    ))
    .bind(alert.kind.to_string())
    .bind(alert.email)
    .bind(alert.reference)
    .bind(alert.details)
    .fetch_one(conn)
    .await?;
    warn!("🗃️ Reconciliation alert #{} ({}) recorded: {}", alert.id, alert.kind, alert.details);
    Ok(alert)
}

pub async fn fetch_alerts(conn: &mut SqliteConnection) -> Result<Vec<ReconciliationAlert>, sqlx::Error> {
    let alerts = sqlx::query_as(&format!("SELECT {ALERT_COLUMNS} FROM reconciliation_alerts ORDER BY id"))
        .fetch_all(conn)
        .await?;
    Ok(alerts)
}
