//! Encounter repository trait: reads plus the scheduling-output writes that
//! are the only mutations this engine performs on encounters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::api::{CourtId, DivisionId, EncounterId, PhaseId, UnitId};
use crate::models::Encounter;

/// New values for an encounter's scheduling-output fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncounterScheduleUpdate {
    pub court_id: Option<CourtId>,
    pub estimated_start: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<i64>,
    pub estimated_end: Option<DateTime<Utc>>,
}

/// Repository trait for encounter reads and scheduling-output writes.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait EncounterRepository: Send + Sync {
    /// Fetch an encounter by ID.
    async fn fetch_encounter(&self, encounter_id: EncounterId) -> RepositoryResult<Encounter>;

    /// All encounters of a division, optionally restricted to one phase.
    /// No status filtering; callers apply their own exclusion rules.
    async fn encounters_for_division(
        &self,
        division_id: DivisionId,
        phase_id: Option<PhaseId>,
    ) -> RepositoryResult<Vec<Encounter>>;

    /// All encounters referencing any of the given units.
    async fn encounters_for_units(&self, unit_ids: &[UnitId]) -> RepositoryResult<Vec<Encounter>>;

    /// Overwrite an encounter's scheduling outputs.
    async fn update_encounter_schedule(
        &self,
        encounter_id: EncounterId,
        update: EncounterScheduleUpdate,
    ) -> RepositoryResult<()>;

    /// Null out court, start, duration, and end for the given encounters.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of encounters that were cleared
    async fn clear_encounter_schedules(
        &self,
        encounter_ids: &[EncounterId],
    ) -> RepositoryResult<usize>;
}
