//! Read-only timeline view over an event's blocks, courts, and divisions.
//!
//! Aggregates per-court time slots (with conflict flags cross-referenced from
//! the validator) and per-division summaries for presentation. Nothing here
//! writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{BlockId, CourtId, DivisionId, EventId, PhaseId};
use crate::db::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};
use crate::scheduler::conflicts::{validate_block_set, Conflict, ConflictKind};

/// Versioned color palette so a division keeps its color across restarts and
/// renders identically everywhere within one palette version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteVersion {
    #[default]
    V1,
}

const PALETTE_V1: [&str; 10] = [
    "#2563eb", "#dc2626", "#16a34a", "#9333ea", "#ea580c", "#0891b2", "#db2777", "#65a30d",
    "#7c3aed", "#b45309",
];

/// Deterministic division color: `division_id mod palette size`. Colors
/// repeat once the division count exceeds the palette.
pub fn division_color(division_id: DivisionId, version: PaletteVersion) -> &'static str {
    let palette = match version {
        PaletteVersion::V1 => &PALETTE_V1,
    };
    let index = division_id.value().rem_euclid(palette.len() as i64) as usize;
    palette[index]
}

/// One block's claim on one court.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub block_id: BlockId,
    pub division_id: DivisionId,
    pub phase_id: Option<PhaseId>,
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// True when this slot participates in a court-overlap conflict.
    pub has_conflict: bool,
}

/// A court with its ordered slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourtTimeline {
    pub court_id: CourtId,
    pub label: String,
    pub slots: Vec<TimeSlot>,
}

/// Per-division rollup for the timeline header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivisionSummary {
    pub division_id: DivisionId,
    pub name: String,
    pub color: String,
    pub block_count: usize,
    /// Counted from the division's encounter collection, not from block
    /// caches.
    pub encounter_count: usize,
    pub first_block_start: Option<DateTime<Utc>>,
    pub last_block_end: Option<DateTime<Utc>>,
}

/// The full timeline view for an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTimeline {
    pub event_id: EventId,
    pub courts: Vec<CourtTimeline>,
    pub divisions: Vec<DivisionSummary>,
    pub conflicts: Vec<Conflict>,
}

/// Build the timeline view for an event.
pub async fn get_timeline<R>(repo: &R, event_id: EventId) -> RepositoryResult<EventTimeline>
where
    R: FullRepository + ?Sized,
{
    if !repo.event_exists(event_id).await? {
        return Err(RepositoryError::not_found(
            format!("Event {} not found", event_id),
            ErrorContext::new("get_timeline")
                .with_entity("event")
                .with_entity_id(event_id),
        ));
    }

    let blocks = repo.blocks_for_event(event_id).await?;
    let conflicts = validate_block_set(&blocks);

    let courts = repo.active_courts_for_event(event_id).await?;
    let mut court_timelines = Vec::with_capacity(courts.len());
    for court in &courts {
        let mut slots: Vec<TimeSlot> = blocks
            .iter()
            .filter(|b| b.court_ids.contains(&court.id))
            .map(|b| TimeSlot {
                block_id: b.id,
                division_id: b.division_id,
                phase_id: b.phase_id,
                label: b.label.clone(),
                start: b.start_time,
                end: b.end_time,
                has_conflict: conflicts.iter().any(|c| {
                    c.kind == ConflictKind::CourtOverlap
                        && c.court_id == Some(court.id)
                        && (c.block_id == b.id || c.other_block_id == b.id)
                }),
            })
            .collect();
        slots.sort_by_key(|s| (s.start, s.block_id));
        court_timelines.push(CourtTimeline {
            court_id: court.id,
            label: court.label.clone(),
            slots,
        });
    }

    let divisions = repo.divisions_for_event(event_id).await?;
    let mut summaries = Vec::with_capacity(divisions.len());
    for division in &divisions {
        let division_blocks: Vec<_> =
            blocks.iter().filter(|b| b.division_id == division.id).collect();
        let encounter_count = repo
            .encounters_for_division(division.id, None)
            .await?
            .len();
        summaries.push(DivisionSummary {
            division_id: division.id,
            name: division.name.clone(),
            color: division_color(division.id, PaletteVersion::V1).to_string(),
            block_count: division_blocks.len(),
            encounter_count,
            first_block_start: division_blocks.iter().map(|b| b.start_time).min(),
            last_block_end: division_blocks.iter().map(|b| b.end_time).max(),
        });
    }

    Ok(EventTimeline {
        event_id,
        courts: court_timelines,
        divisions: summaries,
        conflicts,
    })
}

#[cfg(test)]
#[path = "timeline_tests.rs"]
mod timeline_tests;
