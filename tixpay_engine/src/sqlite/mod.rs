//! SQLite storage backend for the ticketing engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
