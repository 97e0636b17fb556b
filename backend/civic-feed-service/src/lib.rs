/// Civic Feed Service Library
///
/// Ranked, tenant-isolated, personalized feed of civic reports and posts,
/// plus the like / view / share interactions that drive the ranking.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route registration
/// - `services`: engagement scoring, visibility filtering, personalization,
///   feed assembly and the interaction write path
/// - `repository`: storage traits with PostgreSQL and in-memory backends
/// - `models`: content items, interaction records and response shapes
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `db`: Database pool creation and migrations
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use handlers::{configure, AppState};
