use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{ContentItem, FeedEntry, ViewerFlags};
use crate::repository::{InteractionStore, StoreResult};

/// Annotates scored items with the viewer's own interaction flags.
///
/// Read-only: it queries the interaction store but never writes to it.
#[derive(Clone)]
pub struct PersonalizationView {
    interactions: Arc<dyn InteractionStore>,
}

impl PersonalizationView {
    pub fn new(interactions: Arc<dyn InteractionStore>) -> Self {
        Self { interactions }
    }

    /// Annotate a page of `(item, score)` pairs, preserving order
    pub async fn annotate_page(
        &self,
        page: Vec<(ContentItem, f64)>,
        viewer_user_id: Option<Uuid>,
    ) -> StoreResult<Vec<FeedEntry>> {
        let flags = match viewer_user_id {
            Some(user_id) if !page.is_empty() => {
                let ids: Vec<Uuid> = page.iter().map(|(item, _)| item.id).collect();
                self.interactions.viewer_flags(user_id, &ids).await?
            }
            _ => HashMap::new(),
        };

        Ok(page
            .into_iter()
            .map(|(item, score)| {
                let item_flags = flags.get(&item.id).copied();
                annotate(item, score, item_flags)
            })
            .collect())
    }
}

/// Build a feed entry; absent flags mean the viewer has not interacted
pub fn annotate(item: ContentItem, score: f64, flags: Option<ViewerFlags>) -> FeedEntry {
    let flags = flags.unwrap_or_default();

    FeedEntry {
        id: item.id,
        city_id: item.city_id,
        kind: item.kind,
        author_id: item.author_id,
        title: item.title,
        description: item.description,
        status: item.status,
        created_at: item.created_at,
        engagement_score: score,
        likes_count: item.engagement.likes_count,
        views_count: item.engagement.views_count,
        shares_count: item.engagement.shares_count,
        is_liked_by_user: flags.liked,
        is_viewed_by_user: flags.viewed,
        is_shared_by_user: flags.shared,
    }
}
