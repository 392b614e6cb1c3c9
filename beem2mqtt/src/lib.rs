// externally visible interfaces
pub mod beem_api;
pub mod config;
pub mod home_assistant;
pub mod metric_collector;
pub mod mqtt_config;
pub mod mqtt_wrapper;

// internal interfaces
mod home_assistant_config;
