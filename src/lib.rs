//! Unified data-access client over PostgreSQL and MongoDB.
//!
//! storectl presents both stores as one logical catalog of named entities
//! and drives identical CRUD against whichever backend(s) hold each entity.
//! Reads merge both sides, inserts into dual-homed entities alternate
//! between the stores, and updates and deletes address a single row
//! through its declared primary key or document identity.

pub mod backend;
pub mod catalog;
pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod executor;
pub mod menu;
pub mod routing;
pub mod row;

pub use backend::{BackendKind, FieldInput};
pub use catalog::LogicalEntity;
pub use client::StoreClient;
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use executor::Executor;
pub use menu::Menu;
pub use routing::InsertRouter;
pub use row::{Row, RowKey, Value};
