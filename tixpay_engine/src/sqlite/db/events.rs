use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::{
    db_types::{Event, NewEvent},
    traits::TicketingError,
};

pub async fn insert_event(event: NewEvent, conn: &mut SqliteConnection) -> Result<Event, TicketingError> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let event = sqlx::query_as(
        r#"
            INSERT INTO events (id, name, description, location, schedule, price, quota, available_quota, created_at,
            updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8, $8)
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(event.name)
    .bind(event.description)
    .bind(event.location)
    .bind(event.schedule)
    .bind(event.price)
    .bind(event.quota)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(event)
}

pub async fn fetch_event(event_id: &Uuid, conn: &mut SqliteConnection) -> Result<Option<Event>, TicketingError> {
    let event = sqlx::query_as("SELECT * FROM events WHERE id = $1").bind(event_id).fetch_optional(conn).await?;
    Ok(event)
}

pub async fn list_events(limit: i64, offset: i64, conn: &mut SqliteConnection) -> Result<Vec<Event>, TicketingError> {
    let events = sqlx::query_as("SELECT * FROM events ORDER BY schedule ASC, created_at ASC LIMIT $1 OFFSET $2")
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await?;
    Ok(events)
}

/// Decrements the available quota by `quantity`, but only if at least that many units remain.
///
/// This is a single conditional statement, so it is the write that takes the database lock when it opens an atomic
/// unit. If no row is updated, the event is re-read to tell an unknown event apart from an exhausted one.
pub async fn reserve_quota(
    event_id: &Uuid,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Event, TicketingError> {
    if quantity <= 0 {
        return Err(TicketingError::ValidationError(format!("Cannot reserve a quantity of {quantity}")));
    }
    let updated: Option<Event> = sqlx::query_as(
        r#"
            UPDATE events SET available_quota = available_quota - $1, updated_at = $2
            WHERE id = $3 AND available_quota >= $1
            RETURNING *;
        "#,
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(event_id)
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(event) => Ok(event),
        None => {
            let event = fetch_event(event_id, conn).await?.ok_or(TicketingError::EventNotFound(*event_id))?;
            Err(TicketingError::InsufficientQuota {
                event_id: *event_id,
                requested: quantity,
                available: event.available_quota,
            })
        },
    }
}

/// Returns `quantity` units to the event, clamping the available quota at the event's total quota.
pub async fn release_quota(
    event_id: &Uuid,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Event, TicketingError> {
    if quantity <= 0 {
        return Err(TicketingError::ValidationError(format!("Cannot release a quantity of {quantity}")));
    }
    let event = sqlx::query_as(
        r#"
            UPDATE events SET available_quota = MIN(quota, available_quota + $1), updated_at = $2
            WHERE id = $3
            RETURNING *;
        "#,
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(event_id)
    .fetch_optional(conn)
    .await?
    .ok_or(TicketingError::EventNotFound(*event_id))?;
    Ok(event)
}
