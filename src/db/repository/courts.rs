//! Court repository trait: courts, court groups, and division court
//! assignments as consumed by the court pool resolver.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{CourtGroupId, CourtId, DivisionId, EventId, PhaseId};
use crate::models::{Court, CourtGroup, DivisionCourtAssignment};

/// Repository trait for court-related reads.
///
/// Courts and their groupings are created by event administration workflows
/// outside this engine; the scheduler only reads them.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait CourtRepository: Send + Sync {
    /// Fetch a court by ID.
    ///
    /// # Returns
    /// * `Ok(Court)` - The court
    /// * `Err(RepositoryError::NotFound)` - If no such court exists
    async fn fetch_court(&self, court_id: CourtId) -> RepositoryResult<Court>;

    /// Fetch the courts for a set of IDs, skipping IDs that no longer exist.
    ///
    /// Used when resolving a block's stored court list, where a court may
    /// have been deleted after the block was edited.
    async fn fetch_courts(&self, court_ids: &[CourtId]) -> RepositoryResult<Vec<Court>>;

    /// All active courts of an event, ordered by sort order then ID.
    async fn active_courts_for_event(&self, event_id: EventId) -> RepositoryResult<Vec<Court>>;

    /// Fetch a court group by ID.
    async fn fetch_court_group(&self, group_id: CourtGroupId) -> RepositoryResult<CourtGroup>;

    /// Active court assignments for a division.
    ///
    /// When `phase_id` is given, returns assignments scoped to that phase
    /// plus assignments with no phase restriction; otherwise only
    /// unrestricted assignments. Ordered by priority then ID.
    async fn assignments_for_division(
        &self,
        division_id: DivisionId,
        phase_id: Option<PhaseId>,
    ) -> RepositoryResult<Vec<DivisionCourtAssignment>>;
}
