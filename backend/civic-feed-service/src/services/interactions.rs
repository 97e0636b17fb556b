use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::metrics::feed::{INTERACTIONS_TOTAL, TENANT_ISOLATION_VIOLATIONS};
use crate::models::{
    InteractionKind, InteractionTarget, LikeAction, LikeOutcome, ShareOutcome, ViewAction,
    ViewOutcome,
};
use crate::repository::{FeedStore, HiddenSetStore, InteractionStore, StoreError};

/// Entry point for every interaction write.
///
/// Validates input, delegates the atomic mutation to the store and records
/// the outcome. Tenant mismatches are surfaced as
/// [`AppError::TenantIsolation`] and logged on the `security` target.
#[derive(Clone)]
pub struct InteractionService {
    store: Arc<dyn InteractionStore>,
    hidden: Arc<dyn HiddenSetStore>,
}

impl InteractionService {
    pub fn new(store: Arc<dyn InteractionStore>, hidden: Arc<dyn HiddenSetStore>) -> Self {
        Self { store, hidden }
    }

    pub fn from_store<S: FeedStore + 'static>(store: Arc<S>) -> Self {
        Self::new(store.clone(), store)
    }

    pub async fn toggle_like(
        &self,
        target: &InteractionTarget,
        now: DateTime<Utc>,
    ) -> Result<LikeOutcome> {
        let outcome = self
            .store
            .toggle_like(target, now)
            .await
            .map_err(|e| isolation_aware(e, target, InteractionKind::Like))?;

        let action = match outcome.action {
            LikeAction::Added => "added",
            LikeAction::Removed => "removed",
        };
        record(target, InteractionKind::Like, action);

        Ok(outcome)
    }

    /// `duration` is the watch time in seconds reported by the client
    pub async fn register_view(
        &self,
        target: &InteractionTarget,
        duration: f64,
        now: DateTime<Utc>,
    ) -> Result<ViewOutcome> {
        validate_duration(duration)?;

        let outcome = self
            .store
            .register_view(target, duration, now)
            .await
            .map_err(|e| isolation_aware(e, target, InteractionKind::View))?;

        let action = match outcome.action {
            ViewAction::Recorded => "recorded",
            ViewAction::Extended => "extended",
            ViewAction::Unchanged => "unchanged",
        };
        record(target, InteractionKind::View, action);

        Ok(outcome)
    }

    pub async fn register_share(
        &self,
        target: &InteractionTarget,
        now: DateTime<Utc>,
    ) -> Result<ShareOutcome> {
        let outcome = self
            .store
            .register_share(target, now)
            .await
            .map_err(|e| isolation_aware(e, target, InteractionKind::Share))?;

        let action = if outcome.already_shared {
            "already_shared"
        } else {
            "recorded"
        };
        record(target, InteractionKind::Share, action);

        Ok(outcome)
    }

    pub async fn hide(&self, target: &InteractionTarget, now: DateTime<Utc>) -> Result<()> {
        self.hidden
            .hide_item(target.user_id, target.item_id, target.city_id, now)
            .await
            .map_err(|e| match e {
                StoreError::TenantMismatch { .. } => {
                    log_isolation_violation(target, "hide");
                    AppError::TenantIsolation
                }
                other => other.into(),
            })?;

        info!(
            item_id = %target.item_id,
            user_id = %target.user_id,
            "Item hidden from feed"
        );
        Ok(())
    }

    /// Returns whether the item was hidden before the call
    pub async fn unhide(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
        let removed = self.hidden.unhide_item(user_id, item_id).await?;
        info!(item_id = %item_id, user_id = %user_id, removed, "Item unhidden");
        Ok(removed)
    }
}

/// Watch time must be a finite, non-negative number of seconds
pub fn validate_duration(duration: f64) -> Result<()> {
    if !duration.is_finite() || duration < 0.0 {
        return Err(AppError::Validation(
            "duration must be a non-negative number of seconds".into(),
        ));
    }
    Ok(())
}

fn isolation_aware(err: StoreError, target: &InteractionTarget, kind: InteractionKind) -> AppError {
    if let StoreError::TenantMismatch { .. } = err {
        log_isolation_violation(target, kind.as_str());
    }
    err.into()
}

fn log_isolation_violation(target: &InteractionTarget, operation: &str) {
    warn!(
        target: "security",
        item_id = %target.item_id,
        user_id = %target.user_id,
        city_id = ?target.city_id,
        operation,
        "Cross-tenant interaction blocked"
    );
    TENANT_ISOLATION_VIOLATIONS
        .with_label_values(&["interaction"])
        .inc();
}

fn record(target: &InteractionTarget, kind: InteractionKind, action: &str) {
    INTERACTIONS_TOTAL
        .with_label_values(&[kind.as_str(), action])
        .inc();
    info!(
        item_id = %target.item_id,
        user_id = %target.user_id,
        city_id = ?target.city_id,
        kind = kind.as_str(),
        action,
        "Interaction recorded"
    );
}
