//! # hybrid-core
//!
//! Schema model and migration vocabulary for the hybrid document store.
//!
//! Nothing in this crate touches a database:
//!
//! - **Schema model**: [`Column`], [`Table`] and [`DocumentTable`] with
//!   case-insensitive column registries
//! - **Column types**: the closed [`ColumnType`] set and its textual parser
//! - **Commands**: [`MigrationCommand`], one schema change each
//! - **Builder**: [`MigrationBuilder`] producing a validated [`MigrationPlan`]
//! - **Errors**: [`SchemaError`]
//! - **Logging**: subscriber setup and test capture in [`logging`]

#![deny(unsafe_code)]

pub mod builder;
pub mod command;
pub mod errors;
pub mod logging;
pub mod mode;
pub mod plan;
pub mod schema;
pub mod types;

pub use builder::{ColumnSpec, MigrationBuilder};
pub use command::MigrationCommand;
pub use errors::{Result, SchemaError};
pub use mode::BackendMode;
pub use plan::MigrationPlan;
pub use schema::{Column, ColumnKind, DocumentTable, Table, validate_identifier};
pub use types::ColumnType;
