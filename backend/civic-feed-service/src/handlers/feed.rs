use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use super::{parse_id, parse_optional_id, parse_positive, AppState};
use crate::error::Result;
use crate::services::FeedRequest;

/// Query parameters are taken as raw strings so malformed values surface as
/// validation errors with the offending field named.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQueryParams {
    pub user_id: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemQueryParams {
    pub user_id: Option<String>,
    pub city_id: Option<String>,
}

/// GET /feed/city/{city_id}
#[get("/city/{city_id}")]
pub async fn get_city_feed(
    path: web::Path<String>,
    query: web::Query<FeedQueryParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let city_id = parse_id(&path, "cityId")?;
    let user_id = parse_optional_id(query.user_id.as_deref(), "userId")?;
    let page = parse_positive(query.page.as_deref(), "page", 1)?;
    let limit = parse_positive(
        query.limit.as_deref(),
        "limit",
        state.feed_config.default_page_size,
    )?
    .min(state.feed_config.max_page_size);

    debug!(
        "Getting feed: city={} user={:?} page={} limit={}",
        city_id, user_id, page, limit
    );

    let request = FeedRequest {
        city_id,
        user_id,
        page,
        page_size: limit,
    };
    let feed = state.feed.get_feed(&request, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(feed))
}

/// GET /feed/item/{item_id}
#[get("/item/{item_id}")]
pub async fn get_item(
    path: web::Path<String>,
    query: web::Query<ItemQueryParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let item_id = parse_id(&path, "itemId")?;
    let user_id = parse_optional_id(query.user_id.as_deref(), "userId")?;
    let city_id = parse_optional_id(query.city_id.as_deref(), "cityId")?;

    let detail = state
        .feed
        .get_item(item_id, user_id, city_id, Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(detail))
}
