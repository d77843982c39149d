//! HTTP route handlers.

pub mod handling;
pub mod health;
pub mod metrics;
pub mod ordering;
