use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::{
    db_types::{Ticket, Transaction},
    helpers::ticket_code,
    traits::TicketingError,
};

/// Issues one `active` ticket per unit in the transaction.
pub async fn issue_tickets(
    transaction: &Transaction,
    conn: &mut SqliteConnection,
) -> Result<Vec<Ticket>, TicketingError> {
    let mut tickets = Vec::with_capacity(transaction.quantity.max(0) as usize);
    for index in 1..=transaction.quantity {
        let code = ticket_code(&transaction.id, index);
        let ticket = sqlx::query_as(
            r#"
                INSERT INTO tickets (code, transaction_id, event_id, customer_id, status) VALUES ($1, $2, $3, $4, 'active')
                RETURNING *;
            "#,
        )
        .bind(&code)
        .bind(transaction.id)
        .bind(transaction.event_id)
        .bind(transaction.customer_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(err) if err.is_unique_violation() => TicketingError::TicketCodeCollision(code),
            _ => TicketingError::from(e),
        })?;
        tickets.push(ticket);
    }
    Ok(tickets)
}

pub async fn fetch_tickets_for_transaction(
    transaction_id: &Uuid,
    conn: &mut SqliteConnection,
) -> Result<Vec<Ticket>, TicketingError> {
    let tickets = sqlx::query_as("SELECT * FROM tickets WHERE transaction_id = $1 ORDER BY id ASC")
        .bind(transaction_id)
        .fetch_all(conn)
        .await?;
    Ok(tickets)
}
