use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::metrics::feed::TENANT_ISOLATION_VIOLATIONS;
use crate::models::{ContentItem, ViewerContext};
use crate::repository::{HiddenSetStore, StoreResult};

/// Drops foreign-tenant items and the items a viewer has hidden.
///
/// The hidden set is only read here; deciding when an item gets hidden
/// belongs to the hide endpoints and to moderation.
#[derive(Clone)]
pub struct VisibilityFilter {
    hidden: Arc<dyn HiddenSetStore>,
}

impl VisibilityFilter {
    pub fn new(hidden: Arc<dyn HiddenSetStore>) -> Self {
        Self { hidden }
    }

    pub async fn visible(
        &self,
        items: Vec<ContentItem>,
        viewer: &ViewerContext,
    ) -> StoreResult<Vec<ContentItem>> {
        let hidden = match viewer.user_id {
            Some(user_id) => self.hidden.hidden_items(user_id).await?,
            None => HashSet::new(),
        };

        Ok(filter_items(items, viewer, &hidden))
    }
}

/// Tenant re-validation and hidden-set exclusion
pub fn filter_items(
    items: Vec<ContentItem>,
    viewer: &ViewerContext,
    hidden: &HashSet<Uuid>,
) -> Vec<ContentItem> {
    items
        .into_iter()
        .filter(|item| {
            if item.city_id != viewer.city_id {
                // The fetch layer should never hand us these
                warn!(
                    target: "security",
                    item_id = %item.id,
                    item_city_id = %item.city_id,
                    viewer_city_id = %viewer.city_id,
                    "Cross-tenant item dropped from feed"
                );
                TENANT_ISOLATION_VIOLATIONS
                    .with_label_values(&["feed_filter"])
                    .inc();
                return false;
            }
            !hidden.contains(&item.id)
        })
        .collect()
}
