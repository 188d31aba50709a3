//! # Tixpay server
//! This crate hosts the HTTP server for tixpay. It is responsible for:
//! * Managing events, customers and the payment address pool.
//! * Creating ticket transactions and returning the payment instructions (address, amount and deadline).
//! * Starting a background payment monitor for each new transaction, and exposing one-shot payment checks and manual
//!   confirmation.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/v1/...`: The JSON API. See [routes](routes/index.html).
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
