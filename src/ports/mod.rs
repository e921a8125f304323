//! Port traits implemented by [`crate::adapters`].

pub mod config_port;
pub mod event_port;
pub mod series_port;
pub mod transaction_port;
