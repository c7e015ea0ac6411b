//! Greedy court assignment engine.
//!
//! Pure, synchronous functions over in-memory data. Two calling conventions:
//!
//! - [`assign_timed`]: time-aware assignment with per-encounter durations.
//!   Each court carries a next-available clock; every encounter goes to the
//!   court whose clock is smallest at that step.
//! - [`assign_round_robin`]: spreads encounters across courts by cycling an
//!   index, without computing times.
//!
//! Both process encounters strictly in the caller-supplied order. That order
//! is a contract: callers sort by (round, encounter number) or (pool, round,
//! encounter number) before calling, and the engine never reorders for
//! optimality.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{CourtId, EncounterId};
use crate::models::{Court, Encounter};

/// One court/time assignment produced by a timed run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EncounterAssignment {
    pub encounter_id: EncounterId,
    pub court_id: CourtId,
    pub start: DateTime<Utc>,
    pub minutes: i64,
    pub end: DateTime<Utc>,
}

/// Final clock state of one court after a timed run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CourtUsage {
    pub court_id: CourtId,
    /// The court's next-available time when the run finished.
    pub next_available: DateTime<Utc>,
    /// Number of encounters placed on this court.
    pub encounters: usize,
}

/// Result of a timed assignment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedRun {
    pub assignments: Vec<EncounterAssignment>,
    /// Max next-available clock across all courts; equals the run start when
    /// nothing was assigned.
    pub estimated_end: DateTime<Utc>,
    pub court_usage: Vec<CourtUsage>,
}

impl TimedRun {
    /// Distinct courts that received at least one encounter.
    pub fn courts_used(&self) -> usize {
        self.court_usage.iter().filter(|u| u.encounters > 0).count()
    }
}

struct CourtClock {
    court_id: CourtId,
    sort_order: i32,
    next_available: DateTime<Utc>,
    encounters: usize,
}

/// Assign encounters to courts with per-encounter durations.
///
/// Every court's clock starts at `start`. Each encounter, in input order, is
/// placed on the court with the smallest clock (ties broken by court sort
/// order, then ID) and that court's clock advances by the encounter's
/// duration from `minutes_for`.
///
/// Returns `None` when the court pool is empty; an empty encounter list is a
/// successful run with zero assignments.
pub fn assign_timed<F>(
    encounters: &[Encounter],
    courts: &[Court],
    start: DateTime<Utc>,
    minutes_for: F,
) -> Option<TimedRun>
where
    F: Fn(&Encounter) -> i64,
{
    if courts.is_empty() {
        return None;
    }

    let mut clocks: Vec<CourtClock> = courts
        .iter()
        .map(|c| CourtClock {
            court_id: c.id,
            sort_order: c.sort_order,
            next_available: start,
            encounters: 0,
        })
        .collect();

    let mut assignments = Vec::with_capacity(encounters.len());
    for encounter in encounters {
        // Earliest-available court; ties go to the lowest sort order.
        let Some(clock) = clocks
            .iter_mut()
            .min_by_key(|c| (c.next_available, c.sort_order, c.court_id))
        else {
            break;
        };

        let minutes = minutes_for(encounter).max(1);
        let slot_start = clock.next_available;
        let slot_end = slot_start + Duration::minutes(minutes);
        assignments.push(EncounterAssignment {
            encounter_id: encounter.id,
            court_id: clock.court_id,
            start: slot_start,
            minutes,
            end: slot_end,
        });
        clock.next_available = slot_end;
        clock.encounters += 1;
    }

    let estimated_end = clocks
        .iter()
        .map(|c| c.next_available)
        .max()
        .unwrap_or(start);

    Some(TimedRun {
        assignments,
        estimated_end,
        court_usage: clocks
            .into_iter()
            .map(|c| CourtUsage {
                court_id: c.court_id,
                next_available: c.next_available,
                encounters: c.encounters,
            })
            .collect(),
    })
}

/// Spread encounters across courts without timing, cycling a court index.
///
/// Used for phase-level assignment where only "distribute across courts" is
/// needed. Returns `None` when the court pool is empty.
pub fn assign_round_robin(
    encounters: &[Encounter],
    courts: &[Court],
) -> Option<Vec<(EncounterId, CourtId)>> {
    if courts.is_empty() {
        return None;
    }
    let mut index = 0usize;
    let mut assignments = Vec::with_capacity(encounters.len());
    for encounter in encounters {
        assignments.push((encounter.id, courts[index].id));
        index = (index + 1) % courts.len();
    }
    Some(assignments)
}

/// Sort encounters into division-level processing order: round, then
/// encounter number, then ID.
pub fn sort_division_order(encounters: &mut [Encounter]) {
    encounters.sort_by_key(|e| e.division_order_key());
}

/// Sort encounters into phase/block-level processing order: pool, then
/// round, then encounter number, then ID.
pub fn sort_block_order(encounters: &mut [Encounter]) {
    encounters.sort_by_key(|e| e.block_order_key());
}
