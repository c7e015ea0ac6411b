//! Event-scope lookup trait: divisions, phases, and units as the scheduler
//! and the read-only services need them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::api::{DivisionId, EventId, PhaseId, UnitId, UserId};
use crate::models::{Division, Phase, Unit};

/// Repository trait for event-scope lookups.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Whether an event with this ID exists.
    async fn event_exists(&self, event_id: EventId) -> RepositoryResult<bool>;

    /// Fetch a division by ID.
    async fn fetch_division(&self, division_id: DivisionId) -> RepositoryResult<Division>;

    /// All divisions of an event, ordered by ID.
    async fn divisions_for_event(&self, event_id: EventId) -> RepositoryResult<Vec<Division>>;

    /// Fetch a phase by ID.
    async fn fetch_phase(&self, phase_id: PhaseId) -> RepositoryResult<Phase>;

    /// Store a phase's computed estimated end time.
    async fn update_phase_estimated_end(
        &self,
        phase_id: PhaseId,
        estimated_end: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()>;

    /// Fetch a unit by ID.
    async fn fetch_unit(&self, unit_id: UnitId) -> RepositoryResult<Unit>;

    /// Units within an event that the given user belongs to.
    async fn units_for_user(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> RepositoryResult<Vec<Unit>>;
}
