//! MongoDB driver implementation.
//!
//! Provides the document-store backend: collection listing, field sampling,
//! and document CRUD addressed by `_id`.

mod connection;
mod types;

pub use connection::MongoConnection;
