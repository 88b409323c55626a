//! SQLite store for csvql
//!
//! The store is always an in-memory database owned by a single run.

mod connection;

#[cfg(test)]
mod connection_tests;

pub use connection::{SqliteConnection, SqliteTransaction};
