pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod links;
pub mod location;
pub mod logging;
pub mod models;
pub mod resolver;
pub mod ui;
