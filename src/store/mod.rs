//! libSQL-backed storage for the audit trail.

pub mod db;
pub mod migrations;
pub(crate) mod query;
pub(crate) mod row;

pub use db::DataContext;
