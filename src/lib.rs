pub mod app;
pub mod config;
pub mod locale;
pub mod manifest;
pub mod models;
pub mod resolver;
pub mod search;
pub mod selector;
pub mod tmdb;
