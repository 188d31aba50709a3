use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::{
    db_types::{BlockchainTransaction, PaymentEvidence},
    traits::TicketingError,
};

pub async fn insert_evidence(
    transaction_id: &Uuid,
    evidence: PaymentEvidence,
    conn: &mut SqliteConnection,
) -> Result<BlockchainTransaction, TicketingError> {
    let PaymentEvidence { tx_hash, to_address, amount } = evidence;
    let result = sqlx::query_as(
        r#"
            INSERT INTO blockchain_transactions (transaction_id, tx_hash, to_address, amount, status)
            VALUES ($1, $2, $3, $4, 'confirmed')
            RETURNING *;
        "#,
    )
    .bind(transaction_id)
    .bind(&tx_hash)
    .bind(to_address)
    .bind(amount)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => TicketingError::DuplicateEvidence(tx_hash),
        _ => TicketingError::from(e),
    })?;
    Ok(result)
}

pub async fn fetch_evidence(
    transaction_id: &Uuid,
    tx_hash: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<BlockchainTransaction>, TicketingError> {
    let result = sqlx::query_as("SELECT * FROM blockchain_transactions WHERE transaction_id = $1 AND tx_hash = $2")
        .bind(transaction_id)
        .bind(tx_hash)
        .fetch_optional(conn)
        .await?;
    Ok(result)
}

pub async fn fetch_evidence_for_transaction(
    transaction_id: &Uuid,
    conn: &mut SqliteConnection,
) -> Result<Option<BlockchainTransaction>, TicketingError> {
    let result = sqlx::query_as("SELECT * FROM blockchain_transactions WHERE transaction_id = $1")
        .bind(transaction_id)
        .fetch_optional(conn)
        .await?;
    Ok(result)
}
