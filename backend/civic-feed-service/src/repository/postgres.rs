use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

use super::{
    ensure_same_tenant, ContentRepository, HiddenSetStore, InteractionStore, StoreError,
    StoreResult, TenantDirectory,
};
use crate::models::{
    ContentItem, ContentKind, EngagementCounters, InteractionTarget, LikeAction, LikeOutcome,
    ShareOutcome, ViewAction, ViewOutcome, ViewerFlags,
};
use crate::services::scoring;

const ITEM_COLUMNS: &str = "id, city_id, kind, author_id, title, description, status, \
     created_at, likes_count, views_count, shares_count, total_view_seconds, \
     engagement_score, last_score_update";

#[derive(Debug, sqlx::FromRow)]
struct ContentItemRow {
    id: Uuid,
    city_id: Uuid,
    kind: String,
    author_id: Option<Uuid>,
    title: String,
    description: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    likes_count: i64,
    views_count: i64,
    shares_count: i64,
    total_view_seconds: f64,
    engagement_score: f64,
    last_score_update: Option<DateTime<Utc>>,
}

impl ContentItemRow {
    fn into_item(self) -> StoreResult<ContentItem> {
        let kind = ContentKind::parse(&self.kind).ok_or_else(|| {
            StoreError::InvalidData(format!("item {} has unknown kind '{}'", self.id, self.kind))
        })?;

        Ok(ContentItem {
            id: self.id,
            city_id: self.city_id,
            kind,
            author_id: self.author_id,
            title: self.title,
            description: self.description,
            status: self.status,
            created_at: self.created_at,
            engagement: EngagementCounters {
                likes_count: self.likes_count.max(0) as u64,
                views_count: self.views_count.max(0) as u64,
                shares_count: self.shares_count.max(0) as u64,
                total_view_seconds: self.total_view_seconds.max(0.0),
            },
            engagement_score: self.engagement_score,
            last_score_update: self.last_score_update,
        })
    }
}

/// PostgreSQL backend.
///
/// Interaction writes take a row lock on the item (`FOR UPDATE`) inside one
/// transaction, so concurrent writers to the same item are serialized and a
/// failed or abandoned request rolls back completely.
#[derive(Clone)]
pub struct PgFeedStore {
    pool: PgPool,
}

impl PgFeedStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Load and row-lock an item for the rest of the transaction
async fn lock_item(
    tx: &mut Transaction<'_, Postgres>,
    item_id: Uuid,
) -> StoreResult<ContentItem> {
    let sql = format!(
        "SELECT {} FROM content_items WHERE id = $1 FOR UPDATE",
        ITEM_COLUMNS
    );
    let row = sqlx::query_as::<_, ContentItemRow>(&sql)
        .bind(item_id)
        .fetch_optional(&mut **tx)
        .await?;

    row.ok_or(StoreError::ItemNotFound(item_id))?.into_item()
}

/// Persist counters and the refreshed cached score
async fn save_engagement(
    tx: &mut Transaction<'_, Postgres>,
    item: &mut ContentItem,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    item.engagement_score = scoring::score_item(item, now);
    item.last_score_update = Some(now);

    sqlx::query(
        r#"
        UPDATE content_items
        SET likes_count = $2,
            views_count = $3,
            shares_count = $4,
            total_view_seconds = $5,
            engagement_score = $6,
            last_score_update = $7
        WHERE id = $1
        "#,
    )
    .bind(item.id)
    .bind(item.engagement.likes_count as i64)
    .bind(item.engagement.views_count as i64)
    .bind(item.engagement.shares_count as i64)
    .bind(item.engagement.total_view_seconds)
    .bind(item.engagement_score)
    .bind(item.last_score_update)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait]
impl ContentRepository for PgFeedStore {
    async fn list_by_tenant(&self, city_id: Uuid) -> StoreResult<Vec<ContentItem>> {
        let sql = format!(
            "SELECT {} FROM content_items WHERE city_id = $1 ORDER BY created_at DESC, id DESC",
            ITEM_COLUMNS
        );
        let rows = sqlx::query_as::<_, ContentItemRow>(&sql)
            .bind(city_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ContentItemRow::into_item).collect()
    }

    async fn get_item(&self, item_id: Uuid) -> StoreResult<Option<ContentItem>> {
        let sql = format!("SELECT {} FROM content_items WHERE id = $1", ITEM_COLUMNS);
        let row = sqlx::query_as::<_, ContentItemRow>(&sql)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ContentItemRow::into_item).transpose()
    }

    async fn insert_item(&self, item: ContentItem) -> StoreResult<()> {
        if !self.tenant_exists(item.city_id).await? {
            return Err(StoreError::UnknownTenant(item.city_id));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO content_items (
                id, city_id, kind, author_id, title, description, status, created_at,
                likes_count, views_count, shares_count, total_view_seconds,
                engagement_score, last_score_update
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(item.id)
        .bind(item.city_id)
        .bind(item.kind.as_str())
        .bind(item.author_id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.status)
        .bind(item.created_at)
        .bind(item.engagement.likes_count as i64)
        .bind(item.engagement.views_count as i64)
        .bind(item.engagement.shares_count as i64)
        .bind(item.engagement.total_view_seconds)
        .bind(item.engagement_score)
        .bind(item.last_score_update)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DuplicateItem(item.id));
        }

        debug!(item_id = %item.id, city_id = %item.city_id, "Content item stored");
        Ok(())
    }

    async fn delete_item(&self, item_id: Uuid) -> StoreResult<bool> {
        // Interaction rows and hidden-set entries go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM content_items WHERE id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl InteractionStore for PgFeedStore {
    async fn toggle_like(
        &self,
        target: &InteractionTarget,
        now: DateTime<Utc>,
    ) -> StoreResult<LikeOutcome> {
        let mut tx = self.pool.begin().await?;
        let mut item = lock_item(&mut tx, target.item_id).await?;
        ensure_same_tenant(item.id, item.city_id, target.city_id)?;

        let removed = sqlx::query("DELETE FROM item_likes WHERE item_id = $1 AND user_id = $2")
            .bind(target.item_id)
            .bind(target.user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        let action = if removed {
            item.engagement.likes_count = item.engagement.likes_count.saturating_sub(1);
            LikeAction::Removed
        } else {
            sqlx::query("INSERT INTO item_likes (item_id, user_id, liked_at) VALUES ($1, $2, $3)")
                .bind(target.item_id)
                .bind(target.user_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            item.engagement.likes_count += 1;
            LikeAction::Added
        };

        save_engagement(&mut tx, &mut item, now).await?;
        tx.commit().await?;

        Ok(LikeOutcome {
            action,
            likes_count: item.engagement.likes_count,
            is_liked: action == LikeAction::Added,
        })
    }

    async fn register_view(
        &self,
        target: &InteractionTarget,
        duration: f64,
        now: DateTime<Utc>,
    ) -> StoreResult<ViewOutcome> {
        let mut tx = self.pool.begin().await?;
        let mut item = lock_item(&mut tx, target.item_id).await?;
        ensure_same_tenant(item.id, item.city_id, target.city_id)?;

        let existing: Option<f64> = sqlx::query_scalar(
            "SELECT duration_seconds FROM item_views WHERE item_id = $1 AND user_id = $2",
        )
        .bind(target.item_id)
        .bind(target.user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let action = match existing {
            Some(stored) if duration > stored => {
                sqlx::query(
                    r#"
                    UPDATE item_views
                    SET duration_seconds = $3, viewed_at = $4
                    WHERE item_id = $1 AND user_id = $2
                    "#,
                )
                .bind(target.item_id)
                .bind(target.user_id)
                .bind(duration)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                item.engagement.total_view_seconds += duration - stored;
                ViewAction::Extended
            }
            Some(stored) => {
                // Nothing to write; release the row lock before answering
                tx.rollback().await?;
                return Ok(ViewOutcome {
                    action: ViewAction::Unchanged,
                    views_count: item.engagement.views_count,
                    duration: stored,
                });
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO item_views (item_id, user_id, viewed_at, duration_seconds)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(target.item_id)
                .bind(target.user_id)
                .bind(now)
                .bind(duration)
                .execute(&mut *tx)
                .await?;
                item.engagement.views_count += 1;
                item.engagement.total_view_seconds += duration;
                ViewAction::Recorded
            }
        };

        save_engagement(&mut tx, &mut item, now).await?;
        tx.commit().await?;

        Ok(ViewOutcome {
            action,
            views_count: item.engagement.views_count,
            duration,
        })
    }

    async fn register_share(
        &self,
        target: &InteractionTarget,
        now: DateTime<Utc>,
    ) -> StoreResult<ShareOutcome> {
        let mut tx = self.pool.begin().await?;
        let mut item = lock_item(&mut tx, target.item_id).await?;
        ensure_same_tenant(item.id, item.city_id, target.city_id)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO item_shares (item_id, user_id, shared_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (item_id, user_id) DO NOTHING
            "#,
        )
        .bind(target.item_id)
        .bind(target.user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if !inserted {
            tx.rollback().await?;
            return Ok(ShareOutcome {
                shares_count: item.engagement.shares_count,
                already_shared: true,
            });
        }

        item.engagement.shares_count += 1;
        save_engagement(&mut tx, &mut item, now).await?;
        tx.commit().await?;

        Ok(ShareOutcome {
            shares_count: item.engagement.shares_count,
            already_shared: false,
        })
    }

    async fn viewer_flags(
        &self,
        user_id: Uuid,
        item_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, ViewerFlags>> {
        if item_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let liked: Vec<Uuid> = sqlx::query_scalar(
            "SELECT item_id FROM item_likes WHERE user_id = $1 AND item_id = ANY($2)",
        )
        .bind(user_id)
        .bind(item_ids)
        .fetch_all(&self.pool)
        .await?;

        let viewed: Vec<Uuid> = sqlx::query_scalar(
            "SELECT item_id FROM item_views WHERE user_id = $1 AND item_id = ANY($2)",
        )
        .bind(user_id)
        .bind(item_ids)
        .fetch_all(&self.pool)
        .await?;

        let shared: Vec<Uuid> = sqlx::query_scalar(
            "SELECT item_id FROM item_shares WHERE user_id = $1 AND item_id = ANY($2)",
        )
        .bind(user_id)
        .bind(item_ids)
        .fetch_all(&self.pool)
        .await?;

        let liked: HashSet<Uuid> = liked.into_iter().collect();
        let viewed: HashSet<Uuid> = viewed.into_iter().collect();
        let shared: HashSet<Uuid> = shared.into_iter().collect();

        Ok(item_ids
            .iter()
            .map(|id| {
                (
                    *id,
                    ViewerFlags {
                        liked: liked.contains(id),
                        viewed: viewed.contains(id),
                        shared: shared.contains(id),
                    },
                )
            })
            .collect())
    }
}

#[async_trait]
impl HiddenSetStore for PgFeedStore {
    async fn hidden_items(&self, user_id: Uuid) -> StoreResult<HashSet<Uuid>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT item_id FROM user_hidden_items WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids.into_iter().collect())
    }

    async fn hide_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        city_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let item_city: Option<Uuid> =
            sqlx::query_scalar("SELECT city_id FROM content_items WHERE id = $1")
                .bind(item_id)
                .fetch_optional(&self.pool)
                .await?;
        let item_city = item_city.ok_or(StoreError::ItemNotFound(item_id))?;
        ensure_same_tenant(item_id, item_city, city_id)?;

        sqlx::query(
            r#"
            INSERT INTO user_hidden_items (user_id, item_id, hidden_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, item_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(item_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn unhide_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<bool> {
        let result =
            sqlx::query("DELETE FROM user_hidden_items WHERE user_id = $1 AND item_id = $2")
                .bind(user_id)
                .bind(item_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TenantDirectory for PgFeedStore {
    async fn tenant_exists(&self, city_id: Uuid) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cities WHERE id = $1)")
            .bind(city_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }
}
