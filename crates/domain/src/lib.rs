//! Domain layer for the seller portal backend.
//!
//! This crate contains:
//! - Domain models (Seller, Gateway, Device, Subscription, earnings projections)
//! - The earnings pipeline and its data store seam
//! - Live update notifier and dashboard state container

pub mod models;
pub mod services;
