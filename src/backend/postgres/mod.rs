//! PostgreSQL driver implementation.
//!
//! This module implements the `RelationalBackend` trait using SQLx's
//! PgPool: `information_schema` introspection, whole-table scans decoded
//! into the unified `Value` type, and parameterized mutations with
//! server-side casts.

mod connection;
mod schema;
mod types;

pub use connection::PostgresConnection;
