#![allow(dead_code)]

//! Shared fixture builders for integration tests. Upstream registration and
//! bracket-generation workflows create courts, divisions, and encounters in
//! production; these helpers stand in for them.

use chrono::{DateTime, TimeZone, Utc};

use courtside::api::{
    CourtGroupId, CourtId, DivisionCourtAssignmentId, DivisionId, EncounterId, EventId, PhaseId,
    UnitId,
};
use courtside::db::LocalRepository;
use courtside::models::{
    Court, CourtGroup, Division, DivisionCourtAssignment, Encounter, EncounterStatus, Phase,
    PhaseKind,
};

pub const EVENT: EventId = EventId(1);

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
}

/// Fresh repository with the event registered.
pub fn event_repo() -> LocalRepository {
    let repo = LocalRepository::new();
    repo.add_event(EVENT, "Spring Open");
    repo
}

pub fn add_court(repo: &LocalRepository, id: i64, sort_order: i32) {
    repo.add_court(Court {
        id: CourtId::new(id),
        event_id: EVENT,
        label: format!("Court {}", id),
        is_active: true,
        sort_order,
        occupied_by: None,
    });
}

pub fn add_inactive_court(repo: &LocalRepository, id: i64, sort_order: i32) {
    repo.add_court(Court {
        id: CourtId::new(id),
        event_id: EVENT,
        label: format!("Court {}", id),
        is_active: false,
        sort_order,
        occupied_by: None,
    });
}

pub fn add_division(repo: &LocalRepository, id: i64, default_match_minutes: i64) {
    repo.add_division(Division {
        id: DivisionId::new(id),
        event_id: EVENT,
        name: format!("Division {}", id),
        default_match_minutes,
    });
}

pub fn add_phase(repo: &LocalRepository, id: i64, division: i64, minutes: Option<i64>) {
    repo.add_phase(Phase {
        id: PhaseId::new(id),
        division_id: DivisionId::new(division),
        name: None,
        kind: PhaseKind::PoolPlay,
        match_minutes: minutes,
        start_time: None,
        estimated_end: None,
    });
}

pub fn add_phase_with_start(
    repo: &LocalRepository,
    id: i64,
    division: i64,
    start: DateTime<Utc>,
) {
    repo.add_phase(Phase {
        id: PhaseId::new(id),
        division_id: DivisionId::new(division),
        name: Some("Pools".into()),
        kind: PhaseKind::PoolPlay,
        match_minutes: None,
        start_time: Some(start),
        estimated_end: None,
    });
}

/// Minimal schedulable encounter.
pub fn encounter(id: i64, division: i64, round: i32, number: i32) -> Encounter {
    Encounter {
        id: EncounterId::new(id),
        division_id: DivisionId::new(division),
        phase_id: None,
        pool_id: None,
        round_number: round,
        encounter_number: number,
        status: EncounterStatus::NotPlayable,
        unit_ids: vec![UnitId::new(id * 2), UnitId::new(id * 2 + 1)],
        court_id: None,
        estimated_start: None,
        estimated_minutes: None,
        estimated_end: None,
    }
}

pub fn add_encounters(repo: &LocalRepository, division: i64, count: i64) {
    for id in 1..=count {
        repo.add_encounter(encounter(id, division, 1, id as i32));
    }
}

/// Bind a court group to a division through an assignment.
pub fn add_court_group(
    repo: &LocalRepository,
    group_id: i64,
    courts: &[i64],
    division: i64,
    phase: Option<i64>,
    priority: i32,
) {
    repo.add_court_group(CourtGroup {
        id: CourtGroupId::new(group_id),
        event_id: EVENT,
        name: format!("Group {}", group_id),
        court_ids: courts.iter().map(|c| CourtId::new(*c)).collect(),
    });
    repo.add_assignment(DivisionCourtAssignment {
        id: DivisionCourtAssignmentId::new(group_id),
        division_id: DivisionId::new(division),
        phase_id: phase.map(PhaseId::new),
        court_group_id: CourtGroupId::new(group_id),
        priority,
        is_active: true,
    });
}
