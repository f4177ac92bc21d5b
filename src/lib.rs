pub mod app;
pub mod auth;
pub mod authorization;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod spatial;
pub mod storage;

pub use app::{app, AppState};
