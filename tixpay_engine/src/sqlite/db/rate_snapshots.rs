use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewRateSnapshot, RateOrigin, RateSnapshot},
    traits::TicketingError,
};

pub async fn fetch_latest_live_rate(
    currency: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<RateSnapshot>, TicketingError> {
    let result = sqlx::query_as(
        r#"
            SELECT * FROM rate_snapshots WHERE currency = $1 AND origin = $2
            ORDER BY created_at DESC, id DESC LIMIT 1
        "#,
    )
    .bind(currency)
    .bind(RateOrigin::Live)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

pub async fn insert_snapshot(
    snapshot: NewRateSnapshot,
    conn: &mut SqliteConnection,
) -> Result<RateSnapshot, TicketingError> {
    if snapshot.origin == RateOrigin::Cached {
        return Err(TicketingError::ValidationError("Cached rates are not stored as snapshots".into()));
    }
    let result = sqlx::query_as(
        r#"
            INSERT INTO rate_snapshots (currency, rate, origin, created_at) VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(snapshot.currency)
    .bind(snapshot.rate)
    .bind(snapshot.origin)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(result)
}
