//! Integration tests for the division-path scheduling operations: court pool
//! resolution, division assignment, phase assignment, and clearing.

mod support;

use chrono::Duration;

use courtside::api::{CourtId, DivisionId, EncounterId, PhaseId};
use courtside::db::repository::EncounterRepository;
use courtside::models::EncounterStatus;
use courtside::scheduler::auto::AssignDivisionOptions;
use courtside::scheduler::{
    assign_division, assign_phase, calculate_phase_times, clear_division_assignments,
    resolve_courts_for_division,
};

use support::*;

// ==================== Court pool resolver ====================

#[tokio::test]
async fn pool_dedupes_filters_inactive_and_sorts_by_court_order() {
    let repo = event_repo();
    for (id, sort) in [(1, 3), (2, 1), (3, 2)] {
        add_court(&repo, id, sort);
    }
    add_inactive_court(&repo, 4, 0);
    add_division(&repo, 1, 20);
    // Two overlapping groups; court 2 appears in both. Court 4 is inactive.
    add_court_group(&repo, 1, &[1, 2, 4], 1, None, 1);
    add_court_group(&repo, 2, &[2, 3], 1, None, 2);

    let courts = resolve_courts_for_division(&repo, DivisionId::new(1), None)
        .await
        .unwrap();
    // Deduplicated and sorted by court sort order (2,3,1 by sort 1,2,3).
    let ids: Vec<i64> = courts.iter().map(|c| c.id.value()).collect();
    assert_eq!(ids, vec![2, 3, 1]);
}

#[tokio::test]
async fn pool_is_empty_when_nothing_configured() {
    let repo = event_repo();
    add_court(&repo, 1, 1);
    add_division(&repo, 1, 20);

    let courts = resolve_courts_for_division(&repo, DivisionId::new(1), None)
        .await
        .unwrap();
    assert!(courts.is_empty());
}

// ==================== Division assignment ====================

#[tokio::test]
async fn five_encounters_three_courts_concrete_scenario() {
    let repo = event_repo();
    for id in 1..=3 {
        add_court(&repo, id, id as i32);
    }
    add_division(&repo, 1, 20);
    add_encounters(&repo, 1, 5);

    let result = assign_division(
        &repo,
        DivisionId::new(1),
        AssignDivisionOptions {
            start_time: Some(t0()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(result.success, "{}", result.message);
    assert_eq!(result.assigned_count, 5);
    assert_eq!(result.courts_used, 3);
    assert_eq!(result.start_time, Some(t0()));
    // Courts 1 and 2 run until T+40; court 3 only until T+20.
    assert_eq!(result.estimated_end_time, Some(t0() + Duration::minutes(40)));

    let expect = [
        (1, 1, 0),
        (2, 2, 0),
        (3, 3, 0),
        (4, 1, 20),
        (5, 2, 20),
    ];
    for (encounter_id, court_id, offset) in expect {
        let e = repo
            .fetch_encounter(EncounterId::new(encounter_id))
            .await
            .unwrap();
        assert_eq!(e.court_id, Some(CourtId::new(court_id)));
        assert_eq!(e.estimated_start, Some(t0() + Duration::minutes(offset)));
        assert_eq!(e.estimated_minutes, Some(20));
        assert_eq!(
            e.estimated_end,
            Some(t0() + Duration::minutes(offset + 20))
        );
    }
}

#[tokio::test]
async fn assign_division_is_idempotent_with_clear_existing() {
    let repo = event_repo();
    for id in 1..=2 {
        add_court(&repo, id, id as i32);
    }
    add_division(&repo, 1, 25);
    add_encounters(&repo, 1, 6);

    let options = AssignDivisionOptions {
        start_time: Some(t0()),
        clear_existing: true,
        ..Default::default()
    };

    let first = assign_division(&repo, DivisionId::new(1), options.clone())
        .await
        .unwrap();
    let snapshot_one: Vec<_> = {
        let mut v = Vec::new();
        for id in 1..=6 {
            let e = repo.fetch_encounter(EncounterId::new(id)).await.unwrap();
            v.push((e.court_id, e.estimated_start, e.estimated_end));
        }
        v
    };

    let second = assign_division(&repo, DivisionId::new(1), options).await.unwrap();
    for (id, before) in (1..=6).zip(&snapshot_one) {
        let e = repo.fetch_encounter(EncounterId::new(id)).await.unwrap();
        assert_eq!(&(e.court_id, e.estimated_start, e.estimated_end), before);
    }
    assert_eq!(first.assigned_count, second.assigned_count);
    assert_eq!(first.estimated_end_time, second.estimated_end_time);
}

#[tokio::test]
async fn without_clear_existing_only_unassigned_are_placed() {
    let repo = event_repo();
    add_court(&repo, 1, 1);
    add_division(&repo, 1, 20);
    let mut pre_assigned = encounter(1, 1, 1, 1);
    pre_assigned.court_id = Some(CourtId::new(1));
    pre_assigned.estimated_start = Some(t0() - Duration::hours(1));
    repo.add_encounter(pre_assigned);
    repo.add_encounter(encounter(2, 1, 1, 2));

    let result = assign_division(
        &repo,
        DivisionId::new(1),
        AssignDivisionOptions {
            start_time: Some(t0()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(result.assigned_count, 1);

    let untouched = repo.fetch_encounter(EncounterId::new(1)).await.unwrap();
    assert_eq!(untouched.estimated_start, Some(t0() - Duration::hours(1)));
}

#[tokio::test]
async fn locked_encounters_are_never_rescheduled() {
    let repo = event_repo();
    add_court(&repo, 1, 1);
    add_division(&repo, 1, 20);
    let mut in_progress = encounter(1, 1, 1, 1);
    in_progress.status = EncounterStatus::InProgress;
    in_progress.court_id = Some(CourtId::new(1));
    in_progress.estimated_start = Some(t0() - Duration::minutes(10));
    repo.add_encounter(in_progress);
    repo.add_encounter(encounter(2, 1, 1, 2));

    let result = assign_division(
        &repo,
        DivisionId::new(1),
        AssignDivisionOptions {
            start_time: Some(t0()),
            clear_existing: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(result.assigned_count, 1);

    let locked = repo.fetch_encounter(EncounterId::new(1)).await.unwrap();
    assert_eq!(locked.estimated_start, Some(t0() - Duration::minutes(10)));
}

#[tokio::test]
async fn byes_are_skipped() {
    let repo = event_repo();
    add_court(&repo, 1, 1);
    add_division(&repo, 1, 20);
    repo.add_encounter(encounter(1, 1, 1, 1));
    let mut bye = encounter(2, 1, 1, 2);
    bye.status = EncounterStatus::Bye;
    repo.add_encounter(bye);

    let result = assign_division(
        &repo,
        DivisionId::new(1),
        AssignDivisionOptions {
            start_time: Some(t0()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(result.assigned_count, 1);
    let bye = repo.fetch_encounter(EncounterId::new(2)).await.unwrap();
    assert!(bye.court_id.is_none());
}

#[tokio::test]
async fn missing_division_and_empty_preconditions_fail_softly() {
    let repo = event_repo();

    let result = assign_division(&repo, DivisionId::new(42), Default::default())
        .await
        .unwrap();
    assert!(!result.success);
    assert!(result.message.contains("not found"), "{}", result.message);

    // Division exists but no courts anywhere.
    add_division(&repo, 1, 20);
    add_encounters(&repo, 1, 2);
    let result = assign_division(&repo, DivisionId::new(1), Default::default())
        .await
        .unwrap();
    assert!(!result.success);
    assert!(result.message.contains("No courts"), "{}", result.message);

    // Courts exist but nothing to schedule.
    add_court(&repo, 1, 1);
    add_division(&repo, 2, 20);
    let result = assign_division(&repo, DivisionId::new(2), Default::default())
        .await
        .unwrap();
    assert!(!result.success);
    assert!(
        result.message.contains("No encounters"),
        "{}",
        result.message
    );
}

#[tokio::test]
async fn phase_duration_overrides_apply_per_encounter() {
    let repo = event_repo();
    add_court(&repo, 1, 1);
    add_division(&repo, 1, 20);
    add_phase(&repo, 5, 1, Some(35));
    let mut in_phase = encounter(1, 1, 1, 1);
    in_phase.phase_id = Some(PhaseId::new(5));
    repo.add_encounter(in_phase);
    repo.add_encounter(encounter(2, 1, 1, 2));

    let result = assign_division(
        &repo,
        DivisionId::new(1),
        AssignDivisionOptions {
            start_time: Some(t0()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(result.success);

    let first = repo.fetch_encounter(EncounterId::new(1)).await.unwrap();
    assert_eq!(first.estimated_minutes, Some(35));
    let second = repo.fetch_encounter(EncounterId::new(2)).await.unwrap();
    assert_eq!(second.estimated_minutes, Some(20));
    assert_eq!(second.estimated_start, Some(t0() + Duration::minutes(35)));
}

// ==================== Phase assignment ====================

#[tokio::test]
async fn assign_phase_round_robins_without_times() {
    let repo = event_repo();
    for id in 1..=2 {
        add_court(&repo, id, id as i32);
    }
    add_division(&repo, 1, 20);
    add_phase(&repo, 5, 1, None);
    for id in 1..=5 {
        let mut e = encounter(id, 1, 1, id as i32);
        e.phase_id = Some(PhaseId::new(5));
        e.pool_id = Some(1 + id % 2);
        repo.add_encounter(e);
    }

    let result = assign_phase(&repo, PhaseId::new(5)).await.unwrap();
    assert!(result.success, "{}", result.message);
    assert_eq!(result.assigned_count, 5);
    assert_eq!(result.courts_used, 2);

    let mut courts_seen = Vec::new();
    for id in 1..=5 {
        let e = repo.fetch_encounter(EncounterId::new(id)).await.unwrap();
        assert!(e.court_id.is_some());
        assert!(e.estimated_start.is_none(), "round robin sets no times");
        courts_seen.push(e.court_id.unwrap().value());
    }
    assert!(courts_seen.contains(&1) && courts_seen.contains(&2));
}

#[tokio::test]
async fn assign_phase_with_no_encounters_succeeds_empty() {
    let repo = event_repo();
    add_court(&repo, 1, 1);
    add_division(&repo, 1, 20);
    add_phase(&repo, 5, 1, None);

    let result = assign_phase(&repo, PhaseId::new(5)).await.unwrap();
    assert!(result.success);
    assert_eq!(result.assigned_count, 0);
}

#[tokio::test]
async fn assign_phase_excludes_other_phase_court_groups() {
    let repo = event_repo();
    for id in 1..=3 {
        add_court(&repo, id, id as i32);
    }
    add_division(&repo, 1, 20);
    add_phase(&repo, 5, 1, None);
    add_phase(&repo, 6, 1, None);
    // Courts 1-2 belong to another phase's group; only court 3 applies here.
    add_court_group(&repo, 1, &[1, 2], 1, Some(6), 1);
    add_court_group(&repo, 2, &[3], 1, Some(5), 2);
    for id in 1..=2 {
        let mut e = encounter(id, 1, 1, id as i32);
        e.phase_id = Some(PhaseId::new(5));
        repo.add_encounter(e);
    }

    let result = assign_phase(&repo, PhaseId::new(5)).await.unwrap();
    assert!(result.success);
    assert_eq!(result.courts_used, 1);
    for id in 1..=2 {
        let e = repo.fetch_encounter(EncounterId::new(id)).await.unwrap();
        assert_eq!(e.court_id, Some(CourtId::new(3)));
    }
}

// ==================== Phase times ====================

#[tokio::test]
async fn calculate_phase_times_requires_start_time() {
    let repo = event_repo();
    add_court(&repo, 1, 1);
    add_division(&repo, 1, 20);
    add_phase(&repo, 5, 1, None);

    let result = calculate_phase_times(&repo, PhaseId::new(5)).await.unwrap();
    assert!(!result.success);
    assert!(result.message.contains("no start time"), "{}", result.message);
}

#[tokio::test]
async fn calculate_phase_times_sets_times_and_phase_end() {
    use courtside::db::repository::EventRepository;

    let repo = event_repo();
    for id in 1..=2 {
        add_court(&repo, id, id as i32);
    }
    add_division(&repo, 1, 30);
    add_phase_with_start(&repo, 5, 1, t0());
    for id in 1..=3 {
        let mut e = encounter(id, 1, 1, id as i32);
        e.phase_id = Some(PhaseId::new(5));
        repo.add_encounter(e);
    }

    let result = calculate_phase_times(&repo, PhaseId::new(5)).await.unwrap();
    assert!(result.success, "{}", result.message);
    assert_eq!(result.updated_count, 3);
    // Two courts, three 30-minute encounters: end at T+60.
    assert_eq!(result.estimated_end_time, Some(t0() + Duration::minutes(60)));

    let phase = repo.fetch_phase(PhaseId::new(5)).await.unwrap();
    assert_eq!(phase.estimated_end, Some(t0() + Duration::minutes(60)));
}

// ==================== Clearing ====================

#[tokio::test]
async fn clear_division_assignments_skips_locked() {
    let repo = event_repo();
    add_court(&repo, 1, 1);
    add_division(&repo, 1, 20);
    add_encounters(&repo, 1, 3);
    let mut done = encounter(4, 1, 2, 1);
    done.status = EncounterStatus::Completed;
    done.court_id = Some(CourtId::new(1));
    done.estimated_start = Some(t0());
    repo.add_encounter(done);

    assign_division(
        &repo,
        DivisionId::new(1),
        AssignDivisionOptions {
            start_time: Some(t0()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let cleared = clear_division_assignments(&repo, DivisionId::new(1))
        .await
        .unwrap();
    assert_eq!(cleared, 3);

    for id in 1..=3 {
        let e = repo.fetch_encounter(EncounterId::new(id)).await.unwrap();
        assert!(e.court_id.is_none());
        assert!(e.estimated_start.is_none());
    }
    let done = repo.fetch_encounter(EncounterId::new(4)).await.unwrap();
    assert_eq!(done.court_id, Some(CourtId::new(1)));
    assert_eq!(done.estimated_start, Some(t0()));
}

#[tokio::test]
async fn fallback_uses_all_active_event_courts() {
    let repo = event_repo();
    add_court(&repo, 1, 2);
    add_court(&repo, 2, 1);
    add_inactive_court(&repo, 3, 0);
    add_division(&repo, 1, 20);
    add_encounters(&repo, 1, 2);

    // No court groups configured: the event's active courts are used,
    // ordered by sort order (court 2 first).
    let result = assign_division(
        &repo,
        DivisionId::new(1),
        AssignDivisionOptions {
            start_time: Some(t0()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(result.success);

    let first = repo.fetch_encounter(EncounterId::new(1)).await.unwrap();
    assert_eq!(first.court_id, Some(CourtId::new(2)));
    let second = repo.fetch_encounter(EncounterId::new(2)).await.unwrap();
    assert_eq!(second.court_id, Some(CourtId::new(1)));
}
