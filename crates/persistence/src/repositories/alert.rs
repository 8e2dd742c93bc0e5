//! Alert repository contract.

use chrono::{DateTime, Utc};
use domain::models::{Alert, AlertDraft, AlertKind};
use uuid::Uuid;

use crate::error::RepositoryError;

/// Repository for alert rows.
///
/// The conditional mutations (`insert_if_none_active`, `deactivate`,
/// `escalate`, `mark_push_sent`) are the concurrency primitives of the
/// engine: guards are re-checked inside the mutation, never by the caller
/// across a read/act gap, so a concurrent sweep and ingestion cannot tear
/// an alert row or double-apply a transition.
#[async_trait::async_trait]
pub trait AlertRepository: Send + Sync {
    /// Inserts a new active alert unless an active row already exists for
    /// the draft's `(animal_id, kind)`. Returns `None` when the insert
    /// was refused, keeping the at-most-one-active invariant in the
    /// store itself.
    async fn insert_if_none_active(
        &self,
        draft: AlertDraft,
    ) -> Result<Option<Alert>, RepositoryError>;

    /// The active alert for `(animal_id, kind)`, if any.
    async fn find_active(
        &self,
        animal_id: Uuid,
        kind: AlertKind,
    ) -> Result<Option<Alert>, RepositoryError>;

    async fn find_by_id(&self, alert_id: Uuid) -> Result<Option<Alert>, RepositoryError>;

    /// All alerts for an animal, newest first.
    async fn find_for_animal(
        &self,
        animal_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<Alert>, RepositoryError>;

    /// Active, not-yet-escalated alerts of `kind` created at or before
    /// `cutoff`.
    async fn find_escalation_due(
        &self,
        kind: AlertKind,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Alert>, RepositoryError>;

    /// Sets `active = false` if the alert exists and is active. Returns
    /// the updated row, or `None` as a no-op when the alert is missing or
    /// already inactive.
    async fn deactivate(&self, alert_id: Uuid) -> Result<Option<Alert>, RepositoryError>;

    /// Promotes an alert to urgent, applying the replacement text and
    /// stamping `escalated_at`, only if it is still active and not yet
    /// escalated. Returns `None` when another actor got there first.
    async fn escalate(
        &self,
        alert_id: Uuid,
        title: String,
        description: String,
        now: DateTime<Utc>,
    ) -> Result<Option<Alert>, RepositoryError>;

    /// Flags the alert as push-notified. Returns `false` when the alert
    /// is missing or the flag was already set.
    async fn mark_push_sent(&self, alert_id: Uuid) -> Result<bool, RepositoryError>;
}
