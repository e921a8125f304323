//! Core domain types and logic.

pub mod event;
pub mod stats;
pub mod aggregate;
pub mod generator;
pub mod scrape;
pub mod error;
