use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{LineItem, Money, NewProduct, PricedLineItem, Product},
    traits::{validate_line_items, InventoryError, Reservation},
};

pub async fn fetch_product(id: &str, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT id, name, price, stock, updated_at FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

pub async fn fetch_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    let products =
        sqlx::query_as("SELECT id, name, price, stock, updated_at FROM products ORDER BY id").fetch_all(conn).await?;
    Ok(products)
}

/// Inserts the product, or overwrites the name, price and stock of an existing product with the same id.
pub async fn upsert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (id, name, price, stock) VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                price = excluded.price,
                stock = excluded.stock,
                updated_at = CURRENT_TIMESTAMP
            RETURNING id, name, price, stock, updated_at;
        "#,
    )
    .bind(product.id)
    .bind(product.name)
    .bind(product.price.value())
    .bind(product.stock)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

/// Prices the items against the current ledger without writing anything.
pub async fn quote(items: &[LineItem], conn: &mut SqliteConnection) -> Result<Money, InventoryError> {
    let merged = validate_line_items(items)?;
    let mut total = Money::default();
    for (product_id, quantity) in merged {
        let product =
            fetch_product(&product_id, conn).await?.ok_or_else(|| InventoryError::UnknownProduct(product_id.clone()))?;
        if product.stock < quantity {
            return Err(InventoryError::InsufficientStock { product_id, requested: quantity, available: product.stock });
        }
        total = add_line(total, product.price.checked_mul(quantity))?;
    }
    trace!("🗃️ Quoted {total} for {} line items", items.len());
    Ok(total)
}

/// Decrements stock for every item. This is not atomic on its own: call it inside a transaction, and pass `&mut *tx`
/// as the connection argument. If an error is returned, the caller must roll the transaction back.
pub async fn reserve_items(items: &[LineItem], conn: &mut SqliteConnection) -> Result<Reservation, InventoryError> {
    let merged = validate_line_items(items)?;
    let mut total = Money::default();
    let mut priced = Vec::with_capacity(merged.len());
    for (product_id, quantity) in merged {
        let unit_price = decrement_stock(&product_id, quantity, conn).await?;
        let item = PricedLineItem { product_id, quantity, unit_price };
        total = add_line(total, item.line_total())?;
        priced.push(item);
    }
    debug!("🗃️ Reserved stock for {} products. Total: {total}", priced.len());
    Ok(Reservation { total, items: priced })
}

/// The conditional decrement is the very first statement touching the row, so the check and the write cannot be
/// separated by a concurrent writer.
async fn decrement_stock(
    product_id: &str,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Money, InventoryError> {
    let price: Option<i64> = sqlx::query_scalar(
        r#"
            UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND stock >= $1
            RETURNING price;
        "#,
    )
    .bind(quantity)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;
    match price {
        Some(price) => {
            trace!("🗃️ Took {quantity} of {product_id} at {}", Money::from(price));
            Ok(Money::from(price))
        },
        None => match fetch_product(product_id, conn).await? {
            None => Err(InventoryError::UnknownProduct(product_id.to_string())),
            Some(p) => {
                debug!("🗃️ Cannot take {quantity} of {product_id}. Only {} left", p.stock);
                Err(InventoryError::InsufficientStock {
                    product_id: product_id.to_string(),
                    requested: quantity,
                    available: p.stock,
                })
            },
        },
    }
}

fn add_line(total: Money, line: Option<Money>) -> Result<Money, InventoryError> {
    line.and_then(|line| total.value().checked_add(line.value()))
        .map(Money::from)
        .ok_or(InventoryError::TotalOverflow)
}
