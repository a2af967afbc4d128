// Presentation layer - HTTP surface of the rendered dashboard
pub mod app_state;
pub mod handlers;
pub mod view;
