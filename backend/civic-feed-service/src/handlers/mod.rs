/// HTTP handlers for civic-feed-service
///
/// - feed: ranked, personalized tenant feed and single-item lookup
/// - interactions: like / view / share mutators and the hide endpoints
/// - health: liveness and readiness checks
pub mod feed;
pub mod health;
pub mod interactions;

pub use feed::{get_city_feed, get_item};
pub use health::{health_check, liveness_check, readiness_check};
pub use interactions::{hide_item, like_item, share_item, unhide_item, view_item};

use actix_web::web;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::FeedConfig;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::repository::{ContentRepository, FeedStore};
use crate::services::{FeedAssembler, InteractionService};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub feed: FeedAssembler,
    pub interactions: InteractionService,
    /// Used by the readiness check
    pub storage: Arc<dyn ContentRepository>,
    pub feed_config: FeedConfig,
}

impl AppState {
    pub fn from_store<S: FeedStore + 'static>(store: Arc<S>, feed_config: FeedConfig) -> Self {
        Self {
            feed: FeedAssembler::from_store(store.clone()),
            interactions: InteractionService::from_store(store.clone()),
            storage: store,
            feed_config,
        }
    }
}

/// Register every route; the caller provides `web::Data<AppState>`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .service(
        web::scope("/feed")
            .service(get_city_feed)
            .service(get_item)
            .service(like_item)
            .service(view_item)
            .service(share_item)
            .service(
                web::resource("/hide/{item_id}")
                    .route(web::post().to(hide_item))
                    .route(web::delete().to(unhide_item)),
            ),
    )
    .route("/health", web::get().to(health_check))
    .route("/api/v1/health/live", web::get().to(liveness_check))
    .route("/api/v1/health/ready", web::get().to(readiness_check))
    .route("/metrics", web::get().to(metrics::serve_metrics));
}

/// Parse a required identifier
pub(crate) fn parse_id(raw: &str, field: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Validation(format!("{} must be a valid UUID", field)))
}

/// Parse an optional identifier; blank counts as absent
pub(crate) fn parse_optional_id(raw: Option<&str>, field: &str) -> Result<Option<Uuid>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_id(value, field).map(Some),
    }
}

/// Parse a required identifier that may be missing from the payload
pub(crate) fn require_id(raw: Option<&str>, field: &str) -> Result<Uuid> {
    parse_optional_id(raw, field)?
        .ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

/// Parse a positive integer query parameter
pub(crate) fn parse_positive(raw: Option<&str>, field: &str, default: u32) -> Result<u32> {
    let value = match raw.map(str::trim) {
        None | Some("") => return Ok(default),
        Some(value) => value,
    };

    match value.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(AppError::Validation(format!(
            "{} must be a positive integer",
            field
        ))),
    }
}
