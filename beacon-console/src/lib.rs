pub mod analytics;
pub mod api;
pub mod config;
pub mod fetch;
pub mod list;
pub mod state;
