use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{Money, NewOrder, Order, OrderId, OrderStatusType},
    traits::FulfillmentError,
};

const ORDER_COLUMNS: &str = "id, email, items, total, status, payment_ref, created_at, updated_at";

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// The total is passed separately from the order, since it is always the result of a reservation (or, for failed
/// orders, of the charge that was taken), never of anything the caller supplied.
pub async fn insert_order(
    order: NewOrder,
    total: Money,
    conn: &mut SqliteConnection,
) -> Result<Order, FulfillmentError> {
    let items = order.serialized_items().map_err(|e| FulfillmentError::InvalidOrder(e.to_string()))?;
    let order: Order = sqlx::query_as(&format!(
        r#"
            INSERT INTO orders (email, items, total, status, payment_ref)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORDER_COLUMNS};
        "#
    ))
    .bind(order.email)
    .bind(items)
    .bind(total.value())
    .bind(order.status.to_string())
    .bind(order.payment_ref)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order {} inserted for {} with total {}", order.id, order.email, order.total);
    Ok(order)
}

pub async fn fetch_order_by_id(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
        .bind(id.value())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Returns the newest order for the email address that still holds stock, i.e. that is not `Failed`.
pub async fn fetch_latest_order_for_email(
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE email = $1 AND status != 'Failed' ORDER BY id DESC LIMIT 1"
    ))
    .bind(email)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Returns the order bound to the given idempotency key in the dedup log.
pub async fn fetch_order_for_key(key: &str, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            SELECT o.id, o.email, o.items, o.total, o.status, o.payment_ref, o.created_at, o.updated_at
            FROM orders o JOIN fulfillment_keys k ON k.order_id = o.id
            WHERE k.idempotency_key = $1
        "#,
    )
    .bind(key)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Moves the order to `status`, provided the transition is allowed.
///
/// The status guard is part of the `UPDATE` itself, so two concurrent updates cannot both succeed.
pub async fn update_order_status(
    id: OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, FulfillmentError> {
    let allowed_from = [OrderStatusType::Pending, OrderStatusType::ReconciliationPending]
        .into_iter()
        .filter(|from| from.can_transition_to(status))
        .collect::<Vec<_>>();
    if !allowed_from.is_empty() {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET status = ");
        builder.push_bind(status.to_string());
        builder.push(", updated_at = CURRENT_TIMESTAMP WHERE id = ");
        builder.push_bind(id.value());
        builder.push(" AND status IN (");
        let mut statuses = builder.separated(", ");
        for from in allowed_from {
            statuses.push_bind(from.to_string());
        }
        statuses.push_unseparated(") RETURNING ");
        builder.push(ORDER_COLUMNS);
        let updated: Option<Order> = builder.build_query_as().fetch_optional(&mut *conn).await?;
        if let Some(order) = updated {
            trace!("📝️ Order {id} is now {status}");
            return Ok(order);
        }
    }
    match fetch_order_by_id(id, conn).await? {
        None => Err(FulfillmentError::OrderNotFound(id)),
        Some(order) => Err(FulfillmentError::StatusTransitionForbidden { id, from: order.status, to: status }),
    }
}
