use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

use super::{
    ensure_same_tenant, ContentRepository, HiddenSetStore, InteractionStore, StoreError,
    StoreResult, TenantDirectory,
};
use crate::models::{
    ContentItem, InteractionTarget, LikeAction, LikeOutcome, LikeRecord,
    ShareOutcome, ShareRecord, ViewAction, ViewOutcome, ViewRecord, ViewerFlags,
};
use crate::services::scoring;

#[derive(Debug, Default)]
struct ItemInteractions {
    likes: HashMap<Uuid, LikeRecord>,
    views: HashMap<Uuid, ViewRecord>,
    shares: HashMap<Uuid, ShareRecord>,
}

#[derive(Debug)]
struct StoredItem {
    item: ContentItem,
    interactions: ItemInteractions,
}

impl StoredItem {
    /// Stamp the cached score after a counter change
    fn rescore(&mut self, now: DateTime<Utc>) {
        self.item.engagement_score = scoring::score_item(&self.item, now);
        self.item.last_score_update = Some(now);
    }
}

/// In-process backend.
///
/// Every item lives in a single map entry and mutators hold that entry's
/// write guard for the whole check-and-mutate step, so writes to one item are
/// serialized while writes to different items proceed independently.
#[derive(Debug, Default)]
pub struct InMemoryFeedStore {
    tenants: DashSet<Uuid>,
    items: DashMap<Uuid, StoredItem>,
    /// city -> item ids in insertion order
    tenant_index: DashMap<Uuid, Vec<Uuid>>,
    /// user -> hidden item ids
    hidden: DashMap<Uuid, HashSet<Uuid>>,
}

impl InMemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenants(city_ids: impl IntoIterator<Item = Uuid>) -> Self {
        let store = Self::new();
        for city_id in city_ids {
            store.add_tenant(city_id);
        }
        store
    }

    pub fn add_tenant(&self, city_id: Uuid) {
        self.tenants.insert(city_id);
    }

    /// Stored view record of a user, if any
    pub fn view_record(&self, item_id: Uuid, user_id: Uuid) -> Option<ViewRecord> {
        self.items
            .get(&item_id)
            .and_then(|stored| stored.interactions.views.get(&user_id).cloned())
    }

    fn mutate<T>(
        &self,
        target: &InteractionTarget,
        f: impl FnOnce(&mut StoredItem) -> T,
    ) -> StoreResult<T> {
        let mut entry = self
            .items
            .get_mut(&target.item_id)
            .ok_or(StoreError::ItemNotFound(target.item_id))?;
        ensure_same_tenant(target.item_id, entry.item.city_id, target.city_id)?;
        Ok(f(entry.value_mut()))
    }
}

#[async_trait]
impl ContentRepository for InMemoryFeedStore {
    async fn list_by_tenant(&self, city_id: Uuid) -> StoreResult<Vec<ContentItem>> {
        // Copy the ids first so no index guard is held while reading items
        let ids: Vec<Uuid> = match self.tenant_index.get(&city_id) {
            Some(ids) => ids.iter().copied().collect(),
            None => return Ok(Vec::new()),
        };

        let mut items: Vec<ContentItem> = ids
            .iter()
            .filter_map(|id| self.items.get(id).map(|stored| stored.item.clone()))
            .collect();
        // Same order as the postgres listing: created_at DESC, id DESC
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(items)
    }

    async fn get_item(&self, item_id: Uuid) -> StoreResult<Option<ContentItem>> {
        Ok(self.items.get(&item_id).map(|stored| stored.item.clone()))
    }

    async fn insert_item(&self, item: ContentItem) -> StoreResult<()> {
        if !self.tenants.contains(&item.city_id) {
            return Err(StoreError::UnknownTenant(item.city_id));
        }

        let (item_id, city_id) = (item.id, item.city_id);
        match self.items.entry(item_id) {
            Entry::Occupied(_) => return Err(StoreError::DuplicateItem(item_id)),
            Entry::Vacant(slot) => {
                slot.insert(StoredItem {
                    item,
                    interactions: ItemInteractions::default(),
                });
            }
        }
        self.tenant_index.entry(city_id).or_default().push(item_id);

        debug!(item_id = %item_id, city_id = %city_id, "Content item stored");
        Ok(())
    }

    async fn delete_item(&self, item_id: Uuid) -> StoreResult<bool> {
        let Some((_, stored)) = self.items.remove(&item_id) else {
            return Ok(false);
        };

        if let Some(mut ids) = self.tenant_index.get_mut(&stored.item.city_id) {
            ids.retain(|id| *id != item_id);
        }
        for mut hidden in self.hidden.iter_mut() {
            hidden.remove(&item_id);
        }

        debug!(item_id = %item_id, "Content item deleted with its interactions");
        Ok(true)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl InteractionStore for InMemoryFeedStore {
    async fn toggle_like(
        &self,
        target: &InteractionTarget,
        now: DateTime<Utc>,
    ) -> StoreResult<LikeOutcome> {
        self.mutate(target, |stored| {
            let engagement = &mut stored.item.engagement;
            let likes = &mut stored.interactions.likes;
            let action = if likes.remove(&target.user_id).is_some() {
                engagement.likes_count = engagement.likes_count.saturating_sub(1);
                LikeAction::Removed
            } else {
                likes.insert(
                    target.user_id,
                    LikeRecord {
                        user_id: target.user_id,
                        liked_at: now,
                    },
                );
                engagement.likes_count += 1;
                LikeAction::Added
            };
            stored.rescore(now);

            LikeOutcome {
                action,
                likes_count: stored.item.engagement.likes_count,
                is_liked: action == LikeAction::Added,
            }
        })
    }

    async fn register_view(
        &self,
        target: &InteractionTarget,
        duration: f64,
        now: DateTime<Utc>,
    ) -> StoreResult<ViewOutcome> {
        self.mutate(target, |stored| {
            let engagement = &mut stored.item.engagement;
            let (action, stored_duration) =
                match stored.interactions.views.get_mut(&target.user_id) {
                    Some(record) if duration > record.duration => {
                        engagement.total_view_seconds += duration - record.duration;
                        record.duration = duration;
                        record.viewed_at = now;
                        (ViewAction::Extended, duration)
                    }
                    Some(record) => (ViewAction::Unchanged, record.duration),
                    None => {
                        stored.interactions.views.insert(
                            target.user_id,
                            ViewRecord {
                                user_id: target.user_id,
                                viewed_at: now,
                                duration,
                            },
                        );
                        engagement.views_count += 1;
                        engagement.total_view_seconds += duration;
                        (ViewAction::Recorded, duration)
                    }
                };

            if action != ViewAction::Unchanged {
                stored.rescore(now);
            }

            ViewOutcome {
                action,
                views_count: stored.item.engagement.views_count,
                duration: stored_duration,
            }
        })
    }

    async fn register_share(
        &self,
        target: &InteractionTarget,
        now: DateTime<Utc>,
    ) -> StoreResult<ShareOutcome> {
        self.mutate(target, |stored| {
            if stored.interactions.shares.contains_key(&target.user_id) {
                return ShareOutcome {
                    shares_count: stored.item.engagement.shares_count,
                    already_shared: true,
                };
            }

            stored.interactions.shares.insert(
                target.user_id,
                ShareRecord {
                    user_id: target.user_id,
                    shared_at: now,
                },
            );
            stored.item.engagement.shares_count += 1;
            stored.rescore(now);

            ShareOutcome {
                shares_count: stored.item.engagement.shares_count,
                already_shared: false,
            }
        })
    }

    async fn viewer_flags(
        &self,
        user_id: Uuid,
        item_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, ViewerFlags>> {
        let flags = item_ids
            .iter()
            .filter_map(|id| {
                self.items.get(id).map(|stored| {
                    let interactions = &stored.interactions;
                    (
                        *id,
                        ViewerFlags {
                            liked: interactions.likes.contains_key(&user_id),
                            viewed: interactions.views.contains_key(&user_id),
                            shared: interactions.shares.contains_key(&user_id),
                        },
                    )
                })
            })
            .collect();

        Ok(flags)
    }
}

#[async_trait]
impl HiddenSetStore for InMemoryFeedStore {
    async fn hidden_items(&self, user_id: Uuid) -> StoreResult<HashSet<Uuid>> {
        Ok(self
            .hidden
            .get(&user_id)
            .map(|set| set.value().clone())
            .unwrap_or_default())
    }

    async fn hide_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        city_id: Option<Uuid>,
        _now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let item_city = self
            .items
            .get(&item_id)
            .map(|stored| stored.item.city_id)
            .ok_or(StoreError::ItemNotFound(item_id))?;
        ensure_same_tenant(item_id, item_city, city_id)?;

        self.hidden.entry(user_id).or_default().insert(item_id);
        Ok(())
    }

    async fn unhide_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .hidden
            .get_mut(&user_id)
            .map(|mut set| set.remove(&item_id))
            .unwrap_or(false))
    }
}

#[async_trait]
impl TenantDirectory for InMemoryFeedStore {
    async fn tenant_exists(&self, city_id: Uuid) -> StoreResult<bool> {
        Ok(self.tenants.contains(&city_id))
    }
}
