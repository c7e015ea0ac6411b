//! Conflict detection over schedule blocks.
//!
//! Conflicts are advisory findings, not errors: the engine never refuses to
//! write a schedule because of them. Two checks run, both read-only:
//!
//! - Court overlap: within each court, adjacent blocks (sorted by start)
//!   whose windows overlap.
//! - Dependency violation: a block starting before its dependency's end plus
//!   the configured buffer.

use std::collections::HashMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::api::{BlockId, CourtId, EventId};
use crate::db::repository::{BlockRepository, RepositoryResult};
use crate::models::ScheduleBlock;

/// Kind of scheduling conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    CourtOverlap,
    DependencyViolation,
}

/// A single advisory conflict between two blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub block_id: BlockId,
    pub other_block_id: BlockId,
    /// Set for court overlaps; the court both blocks claim.
    pub court_id: Option<CourtId>,
    pub message: String,
}

/// Conflicts plus summary counts, for human review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictReport {
    pub conflicts: Vec<Conflict>,
    pub court_overlaps: usize,
    pub dependency_violations: usize,
}

impl ConflictReport {
    pub fn from_conflicts(conflicts: Vec<Conflict>) -> Self {
        let court_overlaps = conflicts
            .iter()
            .filter(|c| c.kind == ConflictKind::CourtOverlap)
            .count();
        let dependency_violations = conflicts
            .iter()
            .filter(|c| c.kind == ConflictKind::DependencyViolation)
            .count();
        Self {
            conflicts,
            court_overlaps,
            dependency_violations,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Scan blocks for court overlaps and dependency violations.
///
/// Pure over the given block set; callers fetch an event's blocks first.
pub fn validate_block_set(blocks: &[ScheduleBlock]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    // Court overlap: group blocks by court, sort each court's blocks by
    // start, compare adjacent pairs.
    let mut by_court: HashMap<CourtId, Vec<&ScheduleBlock>> = HashMap::new();
    for block in blocks {
        for court_id in &block.court_ids {
            by_court.entry(*court_id).or_default().push(block);
        }
    }
    let mut court_ids: Vec<CourtId> = by_court.keys().copied().collect();
    court_ids.sort();
    for court_id in court_ids {
        let mut court_blocks = by_court.remove(&court_id).unwrap_or_default();
        court_blocks.sort_by_key(|b| (b.start_time, b.id));
        for pair in court_blocks.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            if current.end_time > next.start_time {
                conflicts.push(Conflict {
                    kind: ConflictKind::CourtOverlap,
                    block_id: current.id,
                    other_block_id: next.id,
                    court_id: Some(court_id),
                    message: format!(
                        "Blocks \"{}\" and \"{}\" overlap on court {} ({} > {})",
                        current.label, next.label, court_id, current.end_time, next.start_time
                    ),
                });
            }
        }
    }

    // Dependency violation: stored start earlier than dependency end plus
    // buffer. A dependency outside the given set cannot be checked.
    let by_id: HashMap<BlockId, &ScheduleBlock> =
        blocks.iter().map(|b| (b.id, b)).collect();
    for block in blocks {
        let Some(dep_id) = block.depends_on_block_id else {
            continue;
        };
        let Some(dependency) = by_id.get(&dep_id) else {
            continue;
        };
        let required_start = dependency.end_time + Duration::minutes(block.buffer_minutes);
        if block.start_time < required_start {
            conflicts.push(Conflict {
                kind: ConflictKind::DependencyViolation,
                block_id: block.id,
                other_block_id: dep_id,
                court_id: None,
                message: format!(
                    "Block \"{}\" starts at {} but its dependency \"{}\" requires {} ({} min buffer)",
                    block.label,
                    block.start_time,
                    dependency.label,
                    required_start,
                    block.buffer_minutes
                ),
            });
        }
    }

    conflicts
}

/// Validate all blocks of an event. See [`validate_block_set`].
pub async fn validate_event_blocks<R>(
    repo: &R,
    event_id: EventId,
) -> RepositoryResult<Vec<Conflict>>
where
    R: BlockRepository + ?Sized,
{
    let blocks = repo.blocks_for_event(event_id).await?;
    Ok(validate_block_set(&blocks))
}
