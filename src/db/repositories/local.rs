//! In-memory repository for unit testing and local development.
//!
//! Backed by `parking_lot` locks over hash maps. Lock guards are never held
//! across await points; every method body is synchronous.
//!
//! Courts, divisions, phases, encounters, and units are created by upstream
//! workflows in production; here the `add_*` inherent methods stand in for
//! those workflows when building fixtures. Only blocks get IDs assigned by
//! the repository, because only blocks are created through this engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::api::{
    BlockId, CourtGroupId, CourtId, DivisionId, EncounterId, EventId, PhaseId, UnitId, UserId,
};
use crate::db::repository::{
    BlockRepository, CourtRepository, EncounterRepository, EncounterScheduleUpdate, ErrorContext,
    EventRepository, RepositoryError, RepositoryResult,
};
use crate::models::{
    Court, CourtGroup, Division, DivisionCourtAssignment, Encounter, Phase, ScheduleBlock, Unit,
};

/// In-memory implementation of the repository traits.
#[derive(Default)]
pub struct LocalRepository {
    events: RwLock<HashMap<EventId, String>>,
    courts: RwLock<HashMap<CourtId, Court>>,
    court_groups: RwLock<HashMap<CourtGroupId, CourtGroup>>,
    assignments: RwLock<Vec<DivisionCourtAssignment>>,
    divisions: RwLock<HashMap<DivisionId, Division>>,
    phases: RwLock<HashMap<PhaseId, Phase>>,
    encounters: RwLock<HashMap<EncounterId, Encounter>>,
    units: RwLock<HashMap<UnitId, Unit>>,
    blocks: RwLock<HashMap<BlockId, ScheduleBlock>>,
    next_block_id: AtomicI64,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self {
            next_block_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    // ==================== Fixture helpers ====================

    /// Register an event.
    pub fn add_event(&self, event_id: EventId, name: impl Into<String>) {
        self.events.write().insert(event_id, name.into());
    }

    pub fn add_court(&self, court: Court) {
        self.courts.write().insert(court.id, court);
    }

    pub fn add_court_group(&self, group: CourtGroup) {
        self.court_groups.write().insert(group.id, group);
    }

    pub fn add_assignment(&self, assignment: DivisionCourtAssignment) {
        self.assignments.write().push(assignment);
    }

    pub fn add_division(&self, division: Division) {
        self.divisions.write().insert(division.id, division);
    }

    pub fn add_phase(&self, phase: Phase) {
        self.phases.write().insert(phase.id, phase);
    }

    pub fn add_encounter(&self, encounter: Encounter) {
        self.encounters.write().insert(encounter.id, encounter);
    }

    pub fn add_unit(&self, unit: Unit) {
        self.units.write().insert(unit.id, unit);
    }

    fn not_found(entity: &'static str, id: impl ToString, operation: &str) -> RepositoryError {
        RepositoryError::not_found(
            format!("{} {} not found", entity, id.to_string()),
            ErrorContext::new(operation)
                .with_entity(entity)
                .with_entity_id(id),
        )
    }
}

#[async_trait]
impl CourtRepository for LocalRepository {
    async fn fetch_court(&self, court_id: CourtId) -> RepositoryResult<Court> {
        self.courts
            .read()
            .get(&court_id)
            .cloned()
            .ok_or_else(|| Self::not_found("court", court_id, "fetch_court"))
    }

    async fn fetch_courts(&self, court_ids: &[CourtId]) -> RepositoryResult<Vec<Court>> {
        let courts = self.courts.read();
        Ok(court_ids
            .iter()
            .filter_map(|id| courts.get(id).cloned())
            .collect())
    }

    async fn active_courts_for_event(&self, event_id: EventId) -> RepositoryResult<Vec<Court>> {
        let mut courts: Vec<Court> = self
            .courts
            .read()
            .values()
            .filter(|c| c.event_id == event_id && c.is_active)
            .cloned()
            .collect();
        courts.sort_by_key(|c| (c.sort_order, c.id));
        Ok(courts)
    }

    async fn fetch_court_group(&self, group_id: CourtGroupId) -> RepositoryResult<CourtGroup> {
        self.court_groups
            .read()
            .get(&group_id)
            .cloned()
            .ok_or_else(|| Self::not_found("court_group", group_id, "fetch_court_group"))
    }

    async fn assignments_for_division(
        &self,
        division_id: DivisionId,
        phase_id: Option<PhaseId>,
    ) -> RepositoryResult<Vec<DivisionCourtAssignment>> {
        let mut matches: Vec<DivisionCourtAssignment> = self
            .assignments
            .read()
            .iter()
            .filter(|a| {
                a.is_active
                    && a.division_id == division_id
                    && (a.phase_id.is_none() || a.phase_id == phase_id)
            })
            .cloned()
            .collect();
        matches.sort_by_key(|a| (a.priority, a.id));
        Ok(matches)
    }
}

#[async_trait]
impl EncounterRepository for LocalRepository {
    async fn fetch_encounter(&self, encounter_id: EncounterId) -> RepositoryResult<Encounter> {
        self.encounters
            .read()
            .get(&encounter_id)
            .cloned()
            .ok_or_else(|| Self::not_found("encounter", encounter_id, "fetch_encounter"))
    }

    async fn encounters_for_division(
        &self,
        division_id: DivisionId,
        phase_id: Option<PhaseId>,
    ) -> RepositoryResult<Vec<Encounter>> {
        let mut matches: Vec<Encounter> = self
            .encounters
            .read()
            .values()
            .filter(|e| {
                e.division_id == division_id
                    && (phase_id.is_none() || e.phase_id == phase_id)
            })
            .cloned()
            .collect();
        matches.sort_by_key(|e| e.id);
        Ok(matches)
    }

    async fn encounters_for_units(&self, unit_ids: &[UnitId]) -> RepositoryResult<Vec<Encounter>> {
        let mut matches: Vec<Encounter> = self
            .encounters
            .read()
            .values()
            .filter(|e| e.unit_ids.iter().any(|u| unit_ids.contains(u)))
            .cloned()
            .collect();
        matches.sort_by_key(|e| e.id);
        Ok(matches)
    }

    async fn update_encounter_schedule(
        &self,
        encounter_id: EncounterId,
        update: EncounterScheduleUpdate,
    ) -> RepositoryResult<()> {
        let mut encounters = self.encounters.write();
        let encounter = encounters
            .get_mut(&encounter_id)
            .ok_or_else(|| Self::not_found("encounter", encounter_id, "update_encounter_schedule"))?;
        encounter.court_id = update.court_id;
        encounter.estimated_start = update.estimated_start;
        encounter.estimated_minutes = update.estimated_minutes;
        encounter.estimated_end = update.estimated_end;
        Ok(())
    }

    async fn clear_encounter_schedules(
        &self,
        encounter_ids: &[EncounterId],
    ) -> RepositoryResult<usize> {
        let mut encounters = self.encounters.write();
        let mut cleared = 0;
        for id in encounter_ids {
            if let Some(encounter) = encounters.get_mut(id) {
                encounter.court_id = None;
                encounter.estimated_start = None;
                encounter.estimated_minutes = None;
                encounter.estimated_end = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}

#[async_trait]
impl EventRepository for LocalRepository {
    async fn event_exists(&self, event_id: EventId) -> RepositoryResult<bool> {
        Ok(self.events.read().contains_key(&event_id))
    }

    async fn fetch_division(&self, division_id: DivisionId) -> RepositoryResult<Division> {
        self.divisions
            .read()
            .get(&division_id)
            .cloned()
            .ok_or_else(|| Self::not_found("division", division_id, "fetch_division"))
    }

    async fn divisions_for_event(&self, event_id: EventId) -> RepositoryResult<Vec<Division>> {
        let mut matches: Vec<Division> = self
            .divisions
            .read()
            .values()
            .filter(|d| d.event_id == event_id)
            .cloned()
            .collect();
        matches.sort_by_key(|d| d.id);
        Ok(matches)
    }

    async fn fetch_phase(&self, phase_id: PhaseId) -> RepositoryResult<Phase> {
        self.phases
            .read()
            .get(&phase_id)
            .cloned()
            .ok_or_else(|| Self::not_found("phase", phase_id, "fetch_phase"))
    }

    async fn update_phase_estimated_end(
        &self,
        phase_id: PhaseId,
        estimated_end: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()> {
        let mut phases = self.phases.write();
        let phase = phases
            .get_mut(&phase_id)
            .ok_or_else(|| Self::not_found("phase", phase_id, "update_phase_estimated_end"))?;
        phase.estimated_end = estimated_end;
        Ok(())
    }

    async fn fetch_unit(&self, unit_id: UnitId) -> RepositoryResult<Unit> {
        self.units
            .read()
            .get(&unit_id)
            .cloned()
            .ok_or_else(|| Self::not_found("unit", unit_id, "fetch_unit"))
    }

    async fn units_for_user(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> RepositoryResult<Vec<Unit>> {
        let mut matches: Vec<Unit> = self
            .units
            .read()
            .values()
            .filter(|u| u.event_id == event_id && u.member_user_ids.contains(&user_id))
            .cloned()
            .collect();
        matches.sort_by_key(|u| u.id);
        Ok(matches)
    }
}

#[async_trait]
impl BlockRepository for LocalRepository {
    async fn insert_block(&self, mut block: ScheduleBlock) -> RepositoryResult<ScheduleBlock> {
        block.id = BlockId::new(self.next_block_id.fetch_add(1, Ordering::SeqCst));
        self.blocks.write().insert(block.id, block.clone());
        Ok(block)
    }

    async fn fetch_block(&self, block_id: BlockId) -> RepositoryResult<ScheduleBlock> {
        self.blocks
            .read()
            .get(&block_id)
            .cloned()
            .ok_or_else(|| Self::not_found("block", block_id, "fetch_block"))
    }

    async fn update_block(&self, block: ScheduleBlock) -> RepositoryResult<()> {
        let mut blocks = self.blocks.write();
        if !blocks.contains_key(&block.id) {
            return Err(Self::not_found("block", block.id, "update_block"));
        }
        blocks.insert(block.id, block);
        Ok(())
    }

    async fn delete_block(&self, block_id: BlockId) -> RepositoryResult<()> {
        self.blocks
            .write()
            .remove(&block_id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found("block", block_id, "delete_block"))
    }

    async fn blocks_for_event(&self, event_id: EventId) -> RepositoryResult<Vec<ScheduleBlock>> {
        let mut matches: Vec<ScheduleBlock> = self
            .blocks
            .read()
            .values()
            .filter(|b| b.event_id == event_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.processing_key().cmp(&b.processing_key()));
        Ok(matches)
    }

    async fn clear_dependencies_on(&self, block_id: BlockId) -> RepositoryResult<usize> {
        let mut blocks = self.blocks.write();
        let mut cleared = 0;
        for block in blocks.values_mut() {
            if block.depends_on_block_id == Some(block_id) {
                block.depends_on_block_id = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EncounterStatus, PhaseKind};
    use chrono::TimeZone;

    fn court(id: i64, event: i64, sort: i32, active: bool) -> Court {
        Court {
            id: CourtId::new(id),
            event_id: EventId::new(event),
            label: format!("Court {}", id),
            is_active: active,
            sort_order: sort,
            occupied_by: None,
        }
    }

    #[tokio::test]
    async fn active_courts_sorted_by_sort_order() {
        let repo = LocalRepository::new();
        repo.add_event(EventId::new(1), "Open");
        repo.add_court(court(10, 1, 3, true));
        repo.add_court(court(11, 1, 1, true));
        repo.add_court(court(12, 1, 2, false));

        let courts = repo.active_courts_for_event(EventId::new(1)).await.unwrap();
        let ids: Vec<i64> = courts.iter().map(|c| c.id.value()).collect();
        assert_eq!(ids, vec![11, 10]);
    }

    #[tokio::test]
    async fn fetch_courts_skips_missing_ids() {
        let repo = LocalRepository::new();
        repo.add_court(court(1, 1, 1, true));
        let found = repo
            .fetch_courts(&[CourtId::new(1), CourtId::new(99)])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn block_insert_assigns_sequential_ids() {
        let repo = LocalRepository::new();
        let template = ScheduleBlock {
            id: BlockId::new(0),
            event_id: EventId::new(1),
            division_id: DivisionId::new(1),
            phase_id: None,
            label: "wave".into(),
            court_ids: vec![],
            start_time: Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2026, 6, 1, 11, 0, 0).unwrap(),
            sort_order: 0,
            depends_on_block_id: None,
            buffer_minutes: 0,
            match_minutes_override: None,
            encounter_count: 0,
        };
        let a = repo.insert_block(template.clone()).await.unwrap();
        let b = repo.insert_block(template).await.unwrap();
        assert_eq!(a.id.value(), 1);
        assert_eq!(b.id.value(), 2);
    }

    #[tokio::test]
    async fn clear_dependencies_nulls_references() {
        let repo = LocalRepository::new();
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
        let mk = |dep: Option<BlockId>| ScheduleBlock {
            id: BlockId::new(0),
            event_id: EventId::new(1),
            division_id: DivisionId::new(1),
            phase_id: None,
            label: "wave".into(),
            court_ids: vec![],
            start_time: start,
            end_time: start + chrono::Duration::hours(2),
            sort_order: 0,
            depends_on_block_id: dep,
            buffer_minutes: 0,
            match_minutes_override: None,
            encounter_count: 0,
        };
        let a = repo.insert_block(mk(None)).await.unwrap();
        let b = repo.insert_block(mk(Some(a.id))).await.unwrap();

        let cleared = repo.clear_dependencies_on(a.id).await.unwrap();
        assert_eq!(cleared, 1);
        let b = repo.fetch_block(b.id).await.unwrap();
        assert!(b.depends_on_block_id.is_none());
    }

    #[tokio::test]
    async fn update_encounter_schedule_only_touches_outputs() {
        let repo = LocalRepository::new();
        repo.add_encounter(Encounter {
            id: EncounterId::new(5),
            division_id: DivisionId::new(1),
            phase_id: None,
            pool_id: None,
            round_number: 2,
            encounter_number: 3,
            status: EncounterStatus::NotPlayable,
            unit_ids: vec![UnitId::new(1), UnitId::new(2)],
            court_id: None,
            estimated_start: None,
            estimated_minutes: None,
            estimated_end: None,
        });
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
        repo.update_encounter_schedule(
            EncounterId::new(5),
            EncounterScheduleUpdate {
                court_id: Some(CourtId::new(7)),
                estimated_start: Some(start),
                estimated_minutes: Some(20),
                estimated_end: Some(start + chrono::Duration::minutes(20)),
            },
        )
        .await
        .unwrap();

        let e = repo.fetch_encounter(EncounterId::new(5)).await.unwrap();
        assert_eq!(e.court_id, Some(CourtId::new(7)));
        assert_eq!(e.round_number, 2);
        assert_eq!(e.status, EncounterStatus::NotPlayable);
    }

    #[tokio::test]
    async fn phase_assignments_include_unrestricted() {
        let repo = LocalRepository::new();
        repo.add_phase(Phase {
            id: PhaseId::new(1),
            division_id: DivisionId::new(1),
            name: None,
            kind: PhaseKind::PoolPlay,
            match_minutes: None,
            start_time: None,
            estimated_end: None,
        });
        let mk = |id: i64, phase: Option<i64>, priority: i32| DivisionCourtAssignment {
            id: crate::api::DivisionCourtAssignmentId::new(id),
            division_id: DivisionId::new(1),
            phase_id: phase.map(PhaseId::new),
            court_group_id: CourtGroupId::new(1),
            priority,
            is_active: true,
        };
        repo.add_assignment(mk(1, None, 2));
        repo.add_assignment(mk(2, Some(1), 1));
        repo.add_assignment(mk(3, Some(2), 0));

        let phase_scoped = repo
            .assignments_for_division(DivisionId::new(1), Some(PhaseId::new(1)))
            .await
            .unwrap();
        let ids: Vec<i64> = phase_scoped.iter().map(|a| a.id.value()).collect();
        assert_eq!(ids, vec![2, 1]);

        let unrestricted = repo
            .assignments_for_division(DivisionId::new(1), None)
            .await
            .unwrap();
        assert_eq!(unrestricted.len(), 1);
        assert_eq!(unrestricted[0].id.value(), 1);
    }
}
