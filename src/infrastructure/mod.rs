// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod formatting;
pub mod http_response;
pub mod payload;
pub mod stats_client;
