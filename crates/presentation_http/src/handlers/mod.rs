//! Request handlers

pub mod aggregator;
pub mod health;
