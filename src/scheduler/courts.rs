//! Court pool resolution and encounter duration calculation.
//!
//! The court pool for a division/phase comes from configured court-group
//! assignments; when none are configured, callers fall back to every active
//! court of the event. Duration follows the phase → division → fixed-default
//! fallback chain.

use std::collections::HashSet;

use log::debug;

use crate::api::{DivisionId, EventId, PhaseId};
use crate::db::repository::{CourtRepository, RepositoryResult};
use crate::models::{Court, Division, Phase, DEFAULT_MATCH_MINUTES};

/// Resolve the courts eligible for a division, optionally narrowed to one
/// phase.
///
/// Active court assignments are expanded in priority order into their court
/// groups' member courts, filtered to active courts, deduplicated, and
/// finally sorted by court sort order. A court group that no longer exists is
/// skipped rather than failing the resolution.
///
/// Returns an empty vector when nothing is configured; callers decide whether
/// that is fatal or should fall back to the event's full court set.
pub async fn resolve_courts_for_division<R>(
    repo: &R,
    division_id: DivisionId,
    phase_id: Option<PhaseId>,
) -> RepositoryResult<Vec<Court>>
where
    R: CourtRepository + ?Sized,
{
    let assignments = repo.assignments_for_division(division_id, phase_id).await?;

    let mut seen: HashSet<crate::api::CourtId> = HashSet::new();
    let mut courts: Vec<Court> = Vec::new();
    for assignment in assignments {
        let group = match repo.fetch_court_group(assignment.court_group_id).await {
            Ok(group) => group,
            Err(err) if err.is_not_found() => {
                debug!(
                    "court group {} referenced by assignment {} no longer exists",
                    assignment.court_group_id, assignment.id
                );
                continue;
            }
            Err(err) => return Err(err),
        };
        for court in repo.fetch_courts(&group.court_ids).await? {
            if court.is_active && seen.insert(court.id) {
                courts.push(court);
            }
        }
    }

    courts.sort_by_key(|c| (c.sort_order, c.id));
    Ok(courts)
}

/// Resolve the court pool for a division/phase, falling back to all active
/// courts of the event when no assignment is configured.
pub async fn court_pool_with_fallback<R>(
    repo: &R,
    event_id: EventId,
    division_id: DivisionId,
    phase_id: Option<PhaseId>,
) -> RepositoryResult<Vec<Court>>
where
    R: CourtRepository + ?Sized,
{
    let courts = resolve_courts_for_division(repo, division_id, phase_id).await?;
    if !courts.is_empty() {
        return Ok(courts);
    }
    debug!(
        "no court assignments for division {}; falling back to event {} courts",
        division_id, event_id
    );
    repo.active_courts_for_event(event_id).await
}

/// Expected duration in minutes for an encounter.
///
/// Fallback chain: explicit override (caller/block), phase-level override,
/// division default, fixed default. Non-positive configured values fall
/// through to the next link, so the result is always positive.
pub fn encounter_minutes(
    override_minutes: Option<i64>,
    phase: Option<&Phase>,
    division: &Division,
) -> i64 {
    if let Some(minutes) = override_minutes.filter(|m| *m > 0) {
        return minutes;
    }
    if let Some(minutes) = phase.and_then(|p| p.match_minutes).filter(|m| *m > 0) {
        return minutes;
    }
    if division.default_match_minutes > 0 {
        return division.default_match_minutes;
    }
    DEFAULT_MATCH_MINUTES
}
