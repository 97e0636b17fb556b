use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of citizen content surfaced in the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Report,
    Post,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Report => "report",
            ContentKind::Post => "post",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "report" => Some(ContentKind::Report),
            "post" => Some(ContentKind::Post),
            _ => None,
        }
    }
}

/// Denormalised interaction counters kept on the item.
///
/// Only the interaction store writes these; everything else reads them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementCounters {
    pub likes_count: u64,
    pub views_count: u64,
    pub shares_count: u64,
    /// Sum of the per-user view durations, in seconds
    pub total_view_seconds: f64,
}

impl EngagementCounters {
    /// Mean view duration across view records (0 when there are no views)
    pub fn avg_watch_time(&self) -> f64 {
        if self.views_count == 0 {
            return 0.0;
        }
        let avg = self.total_view_seconds / self.views_count as f64;
        if avg.is_finite() && avg > 0.0 {
            avg
        } else {
            0.0
        }
    }
}

/// A report or post owned by exactly one tenant (city)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub city_id: Uuid,
    pub kind: ContentKind,
    pub author_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub engagement: EngagementCounters,
    /// Score cached on the last successful interaction; a hint, never used for ranking
    pub engagement_score: f64,
    pub last_score_update: Option<DateTime<Utc>>,
}

impl ContentItem {
    /// New item with no interactions
    pub fn new(
        city_id: Uuid,
        kind: ContentKind,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            city_id,
            kind,
            author_id: None,
            title: title.into(),
            description: None,
            status: "open".to_string(),
            created_at,
            engagement: EngagementCounters::default(),
            engagement_score: 0.0,
            last_score_update: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeRecord {
    pub user_id: Uuid,
    pub liked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRecord {
    pub user_id: Uuid,
    pub viewed_at: DateTime<Utc>,
    /// Seconds; never decreases for a given user
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub user_id: Uuid,
    pub shared_at: DateTime<Utc>,
}

/// Who is asking, and from which tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerContext {
    pub user_id: Option<Uuid>,
    pub city_id: Uuid,
}

/// Identifies one interaction write: which item, which user, and the tenant
/// the caller claims to act in (checked against the item when present)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionTarget {
    pub item_id: Uuid,
    pub user_id: Uuid,
    pub city_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Like,
    View,
    Share,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Like => "like",
            InteractionKind::View => "view",
            InteractionKind::Share => "share",
        }
    }
}

/// Like is a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub action: LikeAction,
    pub likes_count: u64,
    pub is_liked: bool,
}

/// View is monotone: a report either creates the record, extends its
/// duration, or leaves it untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewAction {
    Recorded,
    Extended,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewOutcome {
    pub action: ViewAction,
    pub views_count: u64,
    /// Stored duration for this user after the call
    pub duration: f64,
}

/// Share is single-fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareOutcome {
    pub shares_count: u64,
    pub already_shared: bool,
}

/// Per-viewer interaction presence for one item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewerFlags {
    pub liked: bool,
    pub viewed: bool,
    pub shared: bool,
}

/// One entry of the assembled feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub id: Uuid,
    pub city_id: Uuid,
    pub kind: ContentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<Uuid>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    /// Score computed for this request
    pub engagement_score: f64,
    pub likes_count: u64,
    pub views_count: u64,
    pub shares_count: u64,
    pub is_liked_by_user: bool,
    pub is_viewed_by_user: bool,
    pub is_shared_by_user: bool,
}

/// Feed response (`reports` kept for existing mobile clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub reports: Vec<FeedEntry>,
    pub has_more: bool,
    pub page: u32,
    pub total: usize,
}

impl FeedPage {
    pub fn empty(page: u32) -> Self {
        Self {
            reports: Vec::new(),
            has_more: false,
            page,
            total: 0,
        }
    }
}

/// Single item lookup response; carries the stored score alongside the fresh one
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    #[serde(flatten)]
    pub entry: FeedEntry,
    pub cached_score: f64,
    pub last_score_update: Option<DateTime<Utc>>,
}
