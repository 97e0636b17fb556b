//! Storage seam for the feed engine.
//!
//! Interaction collections are only reachable through [`InteractionStore`];
//! the hidden set is only read through [`HiddenSetStore::hidden_items`].
//! Two backends implement every trait: PostgreSQL for deployments and an
//! in-memory store for development and tests.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryFeedStore;
pub use postgres::PgFeedStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ContentItem, InteractionTarget, LikeOutcome, ShareOutcome, ViewOutcome, ViewerFlags,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("content item {0} not found")]
    ItemNotFound(Uuid),

    #[error("content item {item_id} does not belong to the caller's tenant")]
    TenantMismatch { item_id: Uuid },

    #[error("content item {0} already exists")]
    DuplicateItem(Uuid),

    #[error("tenant {0} not found")]
    UnknownTenant(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Rejects the write when the caller names a tenant other than the item's
pub(crate) fn ensure_same_tenant(
    item_id: Uuid,
    item_city: Uuid,
    caller_city: Option<Uuid>,
) -> StoreResult<()> {
    match caller_city {
        Some(city) if city != item_city => Err(StoreError::TenantMismatch { item_id }),
        _ => Ok(()),
    }
}

/// Content items and their tenant index
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// All items of a tenant, newest first
    async fn list_by_tenant(&self, city_id: Uuid) -> StoreResult<Vec<ContentItem>>;

    async fn get_item(&self, item_id: Uuid) -> StoreResult<Option<ContentItem>>;

    /// Fails with [`StoreError::DuplicateItem`] when the id is taken
    async fn insert_item(&self, item: ContentItem) -> StoreResult<()>;

    /// Remove an item together with its interaction log, hidden-set
    /// entries and tenant index entry. Returns false when nothing was deleted.
    async fn delete_item(&self, item_id: Uuid) -> StoreResult<bool>;

    /// Cheap round-trip used by the readiness check
    async fn ping(&self) -> StoreResult<()>;
}

/// The only writer of like/view/share records.
///
/// Each mutator is atomic per item: the tenant check, the record change, the
/// counter update and the cached score refresh happen together or not at all.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Add the user's like when absent, remove it when present
    async fn toggle_like(
        &self,
        target: &InteractionTarget,
        now: DateTime<Utc>,
    ) -> StoreResult<LikeOutcome>;

    /// Record a view, or extend it when `duration` beats the stored one
    async fn register_view(
        &self,
        target: &InteractionTarget,
        duration: f64,
        now: DateTime<Utc>,
    ) -> StoreResult<ViewOutcome>;

    /// Record a share once; later calls are no-ops
    async fn register_share(
        &self,
        target: &InteractionTarget,
        now: DateTime<Utc>,
    ) -> StoreResult<ShareOutcome>;

    /// Which of `item_ids` the user has liked, viewed or shared.
    /// Items without any interaction may be missing from the map.
    async fn viewer_flags(
        &self,
        user_id: Uuid,
        item_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, ViewerFlags>>;
}

/// Per-user set of items the user no longer wants to see
#[async_trait]
pub trait HiddenSetStore: Send + Sync {
    async fn hidden_items(&self, user_id: Uuid) -> StoreResult<HashSet<Uuid>>;

    /// Hide an item for a user; `city_id`, when given, must match the item
    async fn hide_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        city_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Returns false when the item was not hidden
    async fn unhide_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<bool>;
}

/// Catalog of known tenants
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn tenant_exists(&self, city_id: Uuid) -> StoreResult<bool>;
}

/// Everything the service needs from one backend
pub trait FeedStore: ContentRepository + InteractionStore + HiddenSetStore + TenantDirectory {}

impl<T> FeedStore for T where
    T: ContentRepository + InteractionStore + HiddenSetStore + TenantDirectory
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_same_tenant() {
        let item = Uuid::new_v4();
        let city = Uuid::new_v4();

        assert!(ensure_same_tenant(item, city, None).is_ok());
        assert!(ensure_same_tenant(item, city, Some(city)).is_ok());
        assert!(matches!(
            ensure_same_tenant(item, city, Some(Uuid::new_v4())),
            Err(StoreError::TenantMismatch { item_id }) if item_id == item
        ));
    }
}
