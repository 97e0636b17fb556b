use actix_web::{post, web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{parse_id, parse_optional_id, require_id, AppState};
use crate::error::Result;
use crate::models::{InteractionTarget, LikeAction};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRequest {
    pub user_id: Option<String>,
    pub city_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRequest {
    pub user_id: Option<String>,
    pub city_id: Option<String>,
    /// Watch time in seconds
    pub duration: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub likes_count: u64,
    pub is_liked: bool,
    pub action: LikeAction,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    pub views_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub shares_count: u64,
    pub already_shared: bool,
}

#[derive(Debug, Serialize)]
pub struct HideResponse {
    pub hidden: bool,
}

fn target(
    item_id: &str,
    user_id: Option<&str>,
    city_id: Option<&str>,
) -> Result<InteractionTarget> {
    Ok(InteractionTarget {
        item_id: parse_id(item_id, "itemId")?,
        user_id: require_id(user_id, "userId")?,
        city_id: parse_optional_id(city_id, "cityId")?,
    })
}

/// POST /feed/like/{item_id}
#[post("/like/{item_id}")]
pub async fn like_item(
    path: web::Path<String>,
    body: web::Json<InteractionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let target = target(&path, body.user_id.as_deref(), body.city_id.as_deref())?;
    let outcome = state.interactions.toggle_like(&target, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(LikeResponse {
        likes_count: outcome.likes_count,
        is_liked: outcome.is_liked,
        action: outcome.action,
    }))
}

/// POST /feed/view/{item_id}
#[post("/view/{item_id}")]
pub async fn view_item(
    path: web::Path<String>,
    body: web::Json<ViewRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let target = target(&path, body.user_id.as_deref(), body.city_id.as_deref())?;
    let duration = body.duration.unwrap_or(0.0);
    let outcome = state
        .interactions
        .register_view(&target, duration, Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(ViewResponse {
        views_count: outcome.views_count,
    }))
}

/// POST /feed/share/{item_id}
#[post("/share/{item_id}")]
pub async fn share_item(
    path: web::Path<String>,
    body: web::Json<InteractionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let target = target(&path, body.user_id.as_deref(), body.city_id.as_deref())?;
    let outcome = state
        .interactions
        .register_share(&target, Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(ShareResponse {
        shares_count: outcome.shares_count,
        already_shared: outcome.already_shared,
    }))
}

/// POST /feed/hide/{item_id}
pub async fn hide_item(
    path: web::Path<String>,
    body: web::Json<InteractionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let target = target(&path, body.user_id.as_deref(), body.city_id.as_deref())?;
    state.interactions.hide(&target, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(HideResponse { hidden: true }))
}

/// DELETE /feed/hide/{item_id}
pub async fn unhide_item(
    path: web::Path<String>,
    body: web::Json<InteractionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let target = target(&path, body.user_id.as_deref(), None)?;
    state
        .interactions
        .unhide(target.user_id, target.item_id)
        .await?;

    Ok(HttpResponse::Ok().json(HideResponse { hidden: false }))
}
