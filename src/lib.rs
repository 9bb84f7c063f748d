//! Rollcall Attendance Platform
//!
//! A Rust implementation of the Rollcall attendance server, providing a REST
//! JSON API for managing check-in activities, participants, and attendance
//! records.

use std::sync::Arc;

pub mod api;
pub mod checkin;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
