//! # hybrid-store
//!
//! `SQLite` backend for the hybrid document store's schema migrations.
//!
//! - **Translation**: logical types and identifiers to `SQLite` DDL ([`sql`], [`ddl`])
//! - **Introspection**: catalog queries that see uncommitted changes ([`Introspector`])
//! - **Execution**: all-or-nothing batches in a [`MigrationScope`] ([`MigrationExecutor`])
//! - **Entry point**: [`DocumentStore`], durable or ephemeral
//!
//! Durable tables live in the connection's `main` schema. Ephemeral tables
//! live in its `temp` schema: private to the connection and dropped when it
//! closes.

#![deny(unsafe_code)]

pub mod connection;
pub mod ddl;
pub mod errors;
pub mod executor;
pub mod introspect;
pub mod sql;
pub mod store;

pub use connection::ConnectionConfig;
pub use errors::{Result, StoreError};
pub use executor::{MigrationExecutor, MigrationReport, MigrationScope};
pub use introspect::{ColumnInfo, Introspector};
pub use store::DocumentStore;
