//! Feed assembly
//!
//! fetch (tenant-scoped) -> visibility filter -> score -> sort -> paginate -> personalize
//!
//! Scores are always recomputed at read time; the score cached on the item
//! by the last interaction is never used for ordering.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::metrics::feed::{FEED_ITEMS_RETURNED, FEED_REQUESTS_TOTAL, FEED_REQUEST_DURATION_SECONDS};
use crate::models::{ContentItem, FeedPage, ItemDetail, ViewerContext};
use crate::repository::{ContentRepository, FeedStore, TenantDirectory};
use crate::services::personalization::PersonalizationView;
use crate::services::scoring;
use crate::services::visibility::VisibilityFilter;

/// One feed read, already validated (`page` and `page_size` are >= 1)
#[derive(Debug, Clone, Copy)]
pub struct FeedRequest {
    pub city_id: Uuid,
    pub user_id: Option<Uuid>,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Clone)]
pub struct FeedAssembler {
    content: Arc<dyn ContentRepository>,
    tenants: Arc<dyn TenantDirectory>,
    visibility: VisibilityFilter,
    personalization: PersonalizationView,
}

impl FeedAssembler {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        tenants: Arc<dyn TenantDirectory>,
        visibility: VisibilityFilter,
        personalization: PersonalizationView,
    ) -> Self {
        Self {
            content,
            tenants,
            visibility,
            personalization,
        }
    }

    /// Wire every collaborator to the same backend
    pub fn from_store<S: FeedStore + 'static>(store: Arc<S>) -> Self {
        Self::new(
            store.clone(),
            store.clone(),
            VisibilityFilter::new(store.clone()),
            PersonalizationView::new(store),
        )
    }

    pub async fn get_feed(&self, request: &FeedRequest, now: DateTime<Utc>) -> Result<FeedPage> {
        let start = Instant::now();
        let result = self.assemble(request, now).await;

        let outcome = match &result {
            Ok(page) if page.total == 0 => "empty",
            Ok(_) => "served",
            Err(AppError::TenantNotFound) => "tenant_not_found",
            Err(_) => "error",
        };
        FEED_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
        FEED_REQUEST_DURATION_SECONDS
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    async fn assemble(&self, request: &FeedRequest, now: DateTime<Utc>) -> Result<FeedPage> {
        if !self.tenants.tenant_exists(request.city_id).await? {
            return Err(AppError::TenantNotFound);
        }

        let viewer = ViewerContext {
            user_id: request.user_id,
            city_id: request.city_id,
        };

        let items = self.content.list_by_tenant(request.city_id).await?;
        let fetched = items.len();
        let items = self.visibility.visible(items, &viewer).await?;

        if items.is_empty() {
            debug!(city_id = %request.city_id, fetched, "Feed empty after visibility filter");
            return Ok(FeedPage::empty(request.page));
        }

        let ranked = rank(items, now);
        let total = ranked.len();
        let (page_items, has_more) = paginate(ranked, request.page, request.page_size);

        let reports = self
            .personalization
            .annotate_page(page_items, request.user_id)
            .await?;
        FEED_ITEMS_RETURNED.observe(reports.len() as f64);

        debug!(
            city_id = %request.city_id,
            page = request.page,
            page_size = request.page_size,
            fetched,
            total,
            returned = reports.len(),
            has_more,
            "Feed assembled"
        );

        Ok(FeedPage {
            reports,
            has_more,
            page: request.page,
            total,
        })
    }

    /// One item, freshly scored and annotated for the viewer
    pub async fn get_item(
        &self,
        item_id: Uuid,
        viewer_user_id: Option<Uuid>,
        city_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<ItemDetail> {
        let item = self
            .content
            .get_item(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Content item not found".into()))?;

        if matches!(city_id, Some(city) if city != item.city_id) {
            return Err(AppError::TenantIsolation);
        }

        let cached_score = item.engagement_score;
        let last_score_update = item.last_score_update;
        let score = scoring::score_item(&item, now);

        let mut entries = self
            .personalization
            .annotate_page(vec![(item, score)], viewer_user_id)
            .await?;
        let entry = match entries.pop() {
            Some(entry) => entry,
            None => return Err(AppError::Internal("annotation dropped the item".into())),
        };

        Ok(ItemDetail {
            entry,
            cached_score,
            last_score_update,
        })
    }
}

/// Score every item at `now` and sort by score, highest first.
/// Equal scores fall back to recency (newer first).
pub fn rank(items: Vec<ContentItem>, now: DateTime<Utc>) -> Vec<(ContentItem, f64)> {
    let mut scored: Vec<(ContentItem, f64)> = items
        .into_iter()
        .map(|item| {
            let score = scoring::score_item(&item, now);
            (item, score)
        })
        .collect();

    scored.sort_by(|(a, score_a), (b, score_b)| {
        score_b
            .partial_cmp(score_a)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    });

    scored
}

/// Slice one page out of the ranked list; returns `(page, has_more)`
pub fn paginate<T>(items: Vec<T>, page: u32, page_size: u32) -> (Vec<T>, bool) {
    let page_size = page_size.max(1) as usize;
    let skip = (page.max(1) as usize - 1).saturating_mul(page_size);
    let total = items.len();
    let has_more = skip.saturating_add(page_size) < total;

    let page_items = items.into_iter().skip(skip).take(page_size).collect();
    (page_items, has_more)
}
