#![allow(dead_code)]

use actix_web::web;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use civic_feed_service::config::FeedConfig;
use civic_feed_service::models::{ContentItem, ContentKind, EngagementCounters};
use civic_feed_service::repository::{ContentRepository, InMemoryFeedStore};
use civic_feed_service::AppState;

pub struct Fixture {
    pub store: Arc<InMemoryFeedStore>,
    pub state: web::Data<AppState>,
    pub city_a: Uuid,
    pub city_b: Uuid,
}

pub fn fixture() -> Fixture {
    fixture_with(FeedConfig::default())
}

pub fn fixture_with(feed_config: FeedConfig) -> Fixture {
    let city_a = Uuid::new_v4();
    let city_b = Uuid::new_v4();
    let store = Arc::new(InMemoryFeedStore::with_tenants([city_a, city_b]));
    let state = web::Data::new(AppState::from_store(store.clone(), feed_config));

    Fixture {
        store,
        state,
        city_a,
        city_b,
    }
}

/// Insert a report created `age_hours` ago with the given like count
pub async fn seed_item(
    store: &InMemoryFeedStore,
    city_id: Uuid,
    title: &str,
    age_hours: i64,
    likes: u64,
) -> ContentItem {
    let mut item = ContentItem::new(
        city_id,
        ContentKind::Report,
        title,
        Utc::now() - Duration::hours(age_hours),
    );
    item.engagement = EngagementCounters {
        likes_count: likes,
        ..Default::default()
    };
    store
        .insert_item(item.clone())
        .await
        .expect("seed item insert");
    item
}
