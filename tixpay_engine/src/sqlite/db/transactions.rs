use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::{
    db_types::{NewTransaction, Transaction},
    traits::TicketingError,
};

pub async fn insert_transaction(
    transaction: NewTransaction,
    payment_address: &str,
    conn: &mut SqliteConnection,
) -> Result<Transaction, TicketingError> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let result = sqlx::query_as(
        r#"
            INSERT INTO transactions (id, customer_id, event_id, quantity, total_fiat, rate_snapshot,
            settlement_amount, payment_address, status, locked_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', $9, $9, $9)
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(transaction.customer_id)
    .bind(transaction.event_id)
    .bind(transaction.quantity)
    .bind(transaction.total_fiat)
    .bind(transaction.rate_snapshot)
    .bind(transaction.settlement_amount)
    .bind(payment_address)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(result)
}

pub async fn fetch_transaction(id: &Uuid, conn: &mut SqliteConnection) -> Result<Option<Transaction>, TicketingError> {
    let result = sqlx::query_as("SELECT * FROM transactions WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(result)
}

/// The pending to paid transition. Returns `None` if the transaction does not exist or is not pending, so a
/// transaction can only ever be marked as paid once.
pub async fn mark_paid(id: &Uuid, conn: &mut SqliteConnection) -> Result<Option<Transaction>, TicketingError> {
    let now = Utc::now();
    let result = sqlx::query_as(
        r#"
            UPDATE transactions SET status = 'paid', confirmed_at = $1, updated_at = $1
            WHERE id = $2 AND status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(now)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

pub async fn fetch_pending_transactions(conn: &mut SqliteConnection) -> Result<Vec<Transaction>, TicketingError> {
    let result = sqlx::query_as("SELECT * FROM transactions WHERE status = 'pending' ORDER BY locked_at ASC")
        .fetch_all(conn)
        .await?;
    Ok(result)
}
