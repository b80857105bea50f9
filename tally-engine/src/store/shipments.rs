//! Shipment Repository

use super::{RepoError, RepoResult};
use shared::models::{Shipment, ShipmentCreate};
use sqlx::SqlitePool;

/// SQLite caps bound parameters per statement; stay well below it
const IN_CHUNK: usize = 500;

const COLUMNS: &str =
    "id, order_id, carrier, service, tracking_number, label_cost, purchased, refunded, created_at";

pub async fn insert(pool: &SqlitePool, data: ShipmentCreate) -> RepoResult<Shipment> {
    if data.order_id.trim().is_empty() {
        return Err(RepoError::Validation("order_id is required".into()));
    }
    if !data.label_cost.is_finite() || data.label_cost < 0.0 {
        return Err(RepoError::Validation(format!(
            "Invalid label cost: {}",
            data.label_cost
        )));
    }

    let now = shared::util::now_millis();
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO shipments (order_id, carrier, service, tracking_number, label_cost, purchased, refunded, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&data.order_id)
    .bind(&data.carrier)
    .bind(&data.service)
    .bind(&data.tracking_number)
    .bind(data.label_cost)
    .bind(data.purchased)
    .bind(data.refunded)
    .bind(now)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to read shipment after insert".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Shipment>> {
    let sql = format!("SELECT {COLUMNS} FROM shipments WHERE id = ?");
    let row = sqlx::query_as::<_, Shipment>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Purchased, unrefunded labels for the given orders
pub async fn find_purchased_for_orders(
    pool: &SqlitePool,
    order_ids: &[String],
) -> RepoResult<Vec<Shipment>> {
    let mut shipments = Vec::new();
    for chunk in order_ids.chunks(IN_CHUNK) {
        // Dynamic query: variable number of IN placeholders
        let placeholders = chunk.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT {COLUMNS} FROM shipments WHERE purchased = 1 AND refunded = 0 AND order_id IN ({placeholders}) ORDER BY order_id, id"
        );
        let mut query = sqlx::query_as::<_, Shipment>(&sql);
        for id in chunk {
            query = query.bind(id);
        }
        shipments.extend(query.fetch_all(pool).await?);
    }
    Ok(shipments)
}

/// Mark a label as refunded by the carrier
pub async fn mark_refunded(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE shipments SET refunded = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Shipment {id}")));
    }
    Ok(())
}
