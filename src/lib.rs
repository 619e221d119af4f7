pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod membership;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
