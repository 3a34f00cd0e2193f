//! Shared utilities and common types for the seller portal backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Calendar month keys and UTC month windows
//! - Currency rounding and commission arithmetic
//! - Common validation logic
//! - Session token verification

pub mod jwt;
pub mod money;
pub mod period;
pub mod validation;
