//! Persistence layer for the seller portal backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - The PostgreSQL earnings store and change feed listener

pub mod db;
pub mod entities;
pub mod listener;
pub mod metrics;
pub mod repositories;
pub mod store;

pub use listener::ChangeFeedListener;
pub use store::PgEarningsStore;
