use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::{
    db_types::{Customer, NewCustomer},
    traits::TicketingError,
};

pub async fn fetch_customer(id: &Uuid, conn: &mut SqliteConnection) -> Result<Option<Customer>, TicketingError> {
    let customer = sqlx::query_as("SELECT * FROM customers WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(customer)
}

pub async fn fetch_customer_by_email(
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Customer>, TicketingError> {
    let customer =
        sqlx::query_as("SELECT * FROM customers WHERE email = $1").bind(email).fetch_optional(conn).await?;
    Ok(customer)
}

/// Inserts the customer if the email is not known yet, and returns the stored record either way.
///
/// The insert comes first so that concurrent first purchases by the same email cannot both create a customer.
pub async fn fetch_or_create_customer(
    customer: NewCustomer,
    conn: &mut SqliteConnection,
) -> Result<Customer, TicketingError> {
    let now = Utc::now();
    sqlx::query(
        r#"
            INSERT INTO customers (id, email, name, phone, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (email) DO NOTHING;
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&customer.email)
    .bind(&customer.name)
    .bind(&customer.phone)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    fetch_customer_by_email(&customer.email, conn)
        .await?
        .ok_or_else(|| TicketingError::DatabaseError(format!("Customer {} vanished after insert", customer.email)))
}
