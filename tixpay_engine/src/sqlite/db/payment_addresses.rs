use chrono::Utc;
use sqlx::{Row, SqliteConnection};

use crate::{
    db_types::{NewPaymentAddress, PaymentAddress},
    helpers::canonical_evm_address,
    traits::TicketingError,
};

pub async fn insert_address(
    address: NewPaymentAddress,
    conn: &mut SqliteConnection,
) -> Result<PaymentAddress, TicketingError> {
    let NewPaymentAddress { address, secret } = address;
    let address = canonical_evm_address(&address)
        .ok_or_else(|| TicketingError::ValidationError(format!("'{address}' is not a valid EVM address")))?;
    let result = sqlx::query_as(
        r#"
            INSERT INTO payment_addresses (address, secret) VALUES ($1, $2)
            RETURNING *;
        "#,
    )
    .bind(&address)
    .bind(secret.reveal())
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => TicketingError::AddressAlreadyRegistered(address),
        _ => TicketingError::from(e),
    })?;
    Ok(result)
}

/// Claims the oldest unused address in a single conditional statement. The `is_used = 0` guard on the outer update
/// means a row can only ever be flipped once, however many callers race for it.
pub async fn allocate_address(conn: &mut SqliteConnection) -> Result<PaymentAddress, TicketingError> {
    let address = sqlx::query_as(
        r#"
            UPDATE payment_addresses SET is_used = 1, allocated_at = $1
            WHERE id = (SELECT id FROM payment_addresses WHERE is_used = 0 ORDER BY id LIMIT 1) AND is_used = 0
            RETURNING *;
        "#,
    )
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?
    .ok_or(TicketingError::NoAddressAvailable)?;
    Ok(address)
}

pub async fn unused_count(conn: &mut SqliteConnection) -> Result<i64, TicketingError> {
    let count = sqlx::query("SELECT COUNT(*) AS unused FROM payment_addresses WHERE is_used = 0")
        .fetch_one(conn)
        .await?
        .try_get::<i64, _>("unused")?;
    Ok(count)
}
