//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod text_scrape_adapter;
pub mod timestamp;
pub mod yaml_event_adapter;
