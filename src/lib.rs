pub mod aggregate;
pub mod auth;
pub mod category;
pub mod config;
pub mod discover;
pub mod export;
pub mod loader;
pub mod metrics;
pub mod normalize;
pub mod server;
pub mod store;
