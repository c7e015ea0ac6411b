//! Auto-scheduling orchestration.
//!
//! Two paths share the greedy engine:
//!
//! - The division path (`assign_division`, `assign_phase`,
//!   `calculate_phase_times`, `clear_division_assignments`) works on one
//!   division directly.
//! - The event path (`auto_schedule_event`) drives the engine across all
//!   blocks of an event in (sort order, start time) order, applying the
//!   dependency pass first and validating conflicts at the end.
//!
//! Every operation returns a structured result with a success flag and a
//! message. Domain failures (missing division, no courts, no encounters) are
//! soft: they come back as failed results, never as `Err`. `Err` is reserved
//! for storage-level faults.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::api::{BlockId, DivisionId, EventId, PhaseId};
use crate::db::repository::{EncounterScheduleUpdate, FullRepository, RepositoryResult};
use crate::models::{Court, Division, Encounter, Phase, ScheduleBlock};
use crate::scheduler::assignment::{
    assign_round_robin, assign_timed, sort_block_order, sort_division_order,
};
use crate::scheduler::conflicts::{validate_block_set, Conflict};
use crate::scheduler::courts::{court_pool_with_fallback, encounter_minutes};
use crate::scheduler::lock::lock_event;

// ==================== Options ====================

/// Options for `assign_division`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignDivisionOptions {
    /// Global start time for the run; defaults to now.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Fixed per-encounter duration overriding the phase/division chain.
    #[serde(default)]
    pub match_minutes: Option<i64>,
    /// Clear existing assignments (except completed/in-progress encounters)
    /// before assigning.
    #[serde(default)]
    pub clear_existing: bool,
}

/// Options for `auto_schedule_event`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoScheduleOptions {
    /// Restrict the run to these blocks; all active blocks when empty.
    #[serde(default)]
    pub block_ids: Option<Vec<BlockId>>,
    #[serde(default)]
    pub clear_existing: bool,
    /// Run the dependency pass before scheduling.
    #[serde(default)]
    pub recalculate_dependencies: bool,
}

// ==================== Results ====================

/// Result of `assign_division`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignDivisionResult {
    pub success: bool,
    pub message: String,
    pub assigned_count: usize,
    pub courts_used: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub estimated_end_time: Option<DateTime<Utc>>,
}

impl AssignDivisionResult {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            assigned_count: 0,
            courts_used: 0,
            start_time: None,
            estimated_end_time: None,
        }
    }
}

/// Result of `assign_phase`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignPhaseResult {
    pub success: bool,
    pub message: String,
    pub assigned_count: usize,
    pub courts_used: usize,
}

impl AssignPhaseResult {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            assigned_count: 0,
            courts_used: 0,
        }
    }
}

/// Result of `calculate_phase_times`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTimesResult {
    pub success: bool,
    pub message: String,
    pub updated_count: usize,
    pub estimated_end_time: Option<DateTime<Utc>>,
}

impl PhaseTimesResult {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            updated_count: 0,
            estimated_end_time: None,
        }
    }
}

/// Outcome of one block within an `auto_schedule_event` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRunResult {
    pub block_id: BlockId,
    pub label: String,
    pub success: bool,
    pub message: String,
    pub assigned_count: usize,
    /// Max court clock after the block's run; `None` on failure.
    pub end_time: Option<DateTime<Utc>>,
}

/// Result of `auto_schedule_event`. The run is best-effort: per-block
/// failures are recorded in `block_results` and do not abort the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoScheduleResult {
    pub success: bool,
    pub message: String,
    /// Number of blocks scheduled successfully.
    pub blocks_processed: usize,
    pub encounters_scheduled: usize,
    pub block_results: Vec<BlockRunResult>,
    pub conflicts: Vec<Conflict>,
}

impl AutoScheduleResult {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            blocks_processed: 0,
            encounters_scheduled: 0,
            block_results: Vec::new(),
            conflicts: Vec::new(),
        }
    }
}

// ==================== Shared helpers ====================

/// Fetch an entity, converting NotFound into a soft failure message.
fn soft<T>(result: RepositoryResult<T>) -> RepositoryResult<Result<T, String>> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(err) if err.is_not_found() => Ok(Err(err.message().to_string())),
        Err(err) => Err(err),
    }
}

/// Prefetch the phases referenced by a set of encounters. A phase that no
/// longer exists is simply absent from the map; duration resolution then
/// falls through to the division default.
async fn prefetch_phases<R>(
    repo: &R,
    encounters: &[Encounter],
) -> RepositoryResult<HashMap<PhaseId, Phase>>
where
    R: FullRepository + ?Sized,
{
    let mut phases = HashMap::new();
    for encounter in encounters {
        let Some(phase_id) = encounter.phase_id else {
            continue;
        };
        if phases.contains_key(&phase_id) {
            continue;
        }
        match repo.fetch_phase(phase_id).await {
            Ok(phase) => {
                phases.insert(phase_id, phase);
            }
            Err(err) if err.is_not_found() => {
                debug!("phase {} referenced by encounter {} is gone", phase_id, encounter.id);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(phases)
}

async fn persist_timed_run<R>(
    repo: &R,
    run: &crate::scheduler::assignment::TimedRun,
) -> RepositoryResult<()>
where
    R: FullRepository + ?Sized,
{
    for assignment in &run.assignments {
        repo.update_encounter_schedule(
            assignment.encounter_id,
            EncounterScheduleUpdate {
                court_id: Some(assignment.court_id),
                estimated_start: Some(assignment.start),
                estimated_minutes: Some(assignment.minutes),
                estimated_end: Some(assignment.end),
            },
        )
        .await?;
    }
    Ok(())
}

// ==================== Division path ====================

/// Assign every schedulable encounter of a division to a court and time.
///
/// Encounters are processed in (round, encounter number) order. With
/// `clear_existing`, prior assignments of non-locked encounters are wiped
/// first and the run is deterministic for unchanged inputs; without it, only
/// unassigned encounters are placed.
pub async fn assign_division<R>(
    repo: &R,
    division_id: DivisionId,
    options: AssignDivisionOptions,
) -> RepositoryResult<AssignDivisionResult>
where
    R: FullRepository + ?Sized,
{
    let division = match soft(repo.fetch_division(division_id).await)? {
        Ok(division) => division,
        Err(message) => return Ok(AssignDivisionResult::failure(message)),
    };
    let _guard = lock_event(division.event_id).await;

    let courts =
        court_pool_with_fallback(repo, division.event_id, division_id, None).await?;
    if courts.is_empty() {
        return Ok(AssignDivisionResult::failure(format!(
            "No courts configured for division {}",
            division.name
        )));
    }

    let all = repo.encounters_for_division(division_id, None).await?;
    let mut candidates: Vec<Encounter> = all
        .into_iter()
        .filter(|e| e.status.is_schedulable() && !e.status.is_locked())
        .collect();

    if options.clear_existing {
        let assigned: Vec<_> = candidates
            .iter()
            .filter(|e| e.court_id.is_some() || e.estimated_start.is_some())
            .map(|e| e.id)
            .collect();
        if !assigned.is_empty() {
            repo.clear_encounter_schedules(&assigned).await?;
        }
    } else {
        candidates.retain(|e| e.court_id.is_none());
    }

    if candidates.is_empty() {
        return Ok(AssignDivisionResult::failure(format!(
            "No encounters to schedule for division {}",
            division.name
        )));
    }
    sort_division_order(&mut candidates);

    let phases = prefetch_phases(repo, &candidates).await?;
    let start = options.start_time.unwrap_or_else(Utc::now);
    let Some(run) = assign_timed(&candidates, &courts, start, |e| {
        let phase = e.phase_id.and_then(|id| phases.get(&id));
        encounter_minutes(options.match_minutes, phase, &division)
    }) else {
        return Ok(AssignDivisionResult::failure(format!(
            "No courts configured for division {}",
            division.name
        )));
    };

    persist_timed_run(repo, &run).await?;
    info!(
        "assigned {} encounters in division {} across {} courts",
        run.assignments.len(),
        division.name,
        run.courts_used()
    );

    Ok(AssignDivisionResult {
        success: true,
        message: format!(
            "Assigned {} encounters across {} courts",
            run.assignments.len(),
            run.courts_used()
        ),
        assigned_count: run.assignments.len(),
        courts_used: run.courts_used(),
        start_time: Some(start),
        estimated_end_time: Some(run.estimated_end),
    })
}

/// Spread a phase's encounters across its court pool without timing.
///
/// Courts cycle in round-robin order over the encounters sorted by (pool,
/// round, encounter number). No start times are written. An empty encounter
/// set is a success with zero assigned.
pub async fn assign_phase<R>(repo: &R, phase_id: PhaseId) -> RepositoryResult<AssignPhaseResult>
where
    R: FullRepository + ?Sized,
{
    let phase = match soft(repo.fetch_phase(phase_id).await)? {
        Ok(phase) => phase,
        Err(message) => return Ok(AssignPhaseResult::failure(message)),
    };
    let division = repo.fetch_division(phase.division_id).await?;
    let _guard = lock_event(division.event_id).await;

    let courts =
        court_pool_with_fallback(repo, division.event_id, division.id, Some(phase_id)).await?;
    if courts.is_empty() {
        return Ok(AssignPhaseResult::failure(format!(
            "No courts available for phase {}",
            phase.display_name()
        )));
    }

    let mut encounters: Vec<Encounter> = repo
        .encounters_for_division(division.id, Some(phase_id))
        .await?
        .into_iter()
        .filter(|e| e.status.is_schedulable() && !e.status.is_locked())
        .collect();
    sort_block_order(&mut encounters);

    let Some(assignments) = assign_round_robin(&encounters, &courts) else {
        return Ok(AssignPhaseResult::failure(format!(
            "No courts available for phase {}",
            phase.display_name()
        )));
    };

    for (encounter, (encounter_id, court_id)) in encounters.iter().zip(&assignments) {
        debug_assert_eq!(encounter.id, *encounter_id);
        repo.update_encounter_schedule(
            *encounter_id,
            EncounterScheduleUpdate {
                court_id: Some(*court_id),
                estimated_start: encounter.estimated_start,
                estimated_minutes: encounter.estimated_minutes,
                estimated_end: encounter.estimated_end,
            },
        )
        .await?;
    }

    let courts_used = courts.len().min(assignments.len());
    Ok(AssignPhaseResult {
        success: true,
        message: format!(
            "Assigned {} encounters across {} courts",
            assignments.len(),
            courts_used
        ),
        assigned_count: assignments.len(),
        courts_used,
    })
}

/// Compute start/end times for a phase's encounters from the phase's start
/// time, and store the phase's estimated end.
pub async fn calculate_phase_times<R>(
    repo: &R,
    phase_id: PhaseId,
) -> RepositoryResult<PhaseTimesResult>
where
    R: FullRepository + ?Sized,
{
    let phase = match soft(repo.fetch_phase(phase_id).await)? {
        Ok(phase) => phase,
        Err(message) => return Ok(PhaseTimesResult::failure(message)),
    };
    let Some(start) = phase.start_time else {
        return Ok(PhaseTimesResult::failure(format!(
            "Phase {} has no start time",
            phase.display_name()
        )));
    };
    let division = repo.fetch_division(phase.division_id).await?;
    let _guard = lock_event(division.event_id).await;

    let courts =
        court_pool_with_fallback(repo, division.event_id, division.id, Some(phase_id)).await?;
    if courts.is_empty() {
        return Ok(PhaseTimesResult::failure(format!(
            "No courts available for phase {}",
            phase.display_name()
        )));
    }

    let mut encounters: Vec<Encounter> = repo
        .encounters_for_division(division.id, Some(phase_id))
        .await?
        .into_iter()
        .filter(|e| e.status.is_schedulable() && !e.status.is_locked())
        .collect();
    sort_block_order(&mut encounters);

    let Some(run) = assign_timed(&encounters, &courts, start, |_| {
        encounter_minutes(None, Some(&phase), &division)
    }) else {
        return Ok(PhaseTimesResult::failure(format!(
            "No courts available for phase {}",
            phase.display_name()
        )));
    };

    persist_timed_run(repo, &run).await?;
    let estimated_end = if run.assignments.is_empty() {
        None
    } else {
        Some(run.estimated_end)
    };
    repo.update_phase_estimated_end(phase_id, estimated_end).await?;

    Ok(PhaseTimesResult {
        success: true,
        message: format!("Updated times for {} encounters", run.assignments.len()),
        updated_count: run.assignments.len(),
        estimated_end_time: estimated_end,
    })
}

/// Clear court/time assignments for a division's encounters, skipping
/// completed and in-progress ones.
///
/// # Returns
/// * `Ok(usize)` - Number of encounters cleared
pub async fn clear_division_assignments<R>(
    repo: &R,
    division_id: DivisionId,
) -> RepositoryResult<usize>
where
    R: FullRepository + ?Sized,
{
    let division = repo.fetch_division(division_id).await?;
    let _guard = lock_event(division.event_id).await;

    let targets: Vec<_> = repo
        .encounters_for_division(division_id, None)
        .await?
        .into_iter()
        .filter(|e| {
            !e.status.is_locked()
                && (e.court_id.is_some()
                    || e.estimated_start.is_some()
                    || e.estimated_end.is_some())
        })
        .map(|e| e.id)
        .collect();
    if targets.is_empty() {
        return Ok(0);
    }
    repo.clear_encounter_schedules(&targets).await
}

// ==================== Event path ====================

/// One forward pass over blocks in processing order, moving each dependent
/// block's window to its dependency's end plus the buffer.
///
/// Not a topological sort: a block whose dependency appears later in the
/// pass keeps its stale start until a subsequent run.
async fn apply_dependency_pass<R>(
    repo: &R,
    blocks: &mut [ScheduleBlock],
    event_blocks: &[ScheduleBlock],
) -> RepositoryResult<usize>
where
    R: FullRepository + ?Sized,
{
    // Window snapshot of every block in the event, refreshed as we move
    // in-scope blocks, so a dependency processed earlier in this pass is
    // seen at its updated position.
    let mut windows: HashMap<BlockId, (DateTime<Utc>, DateTime<Utc>)> = event_blocks
        .iter()
        .map(|b| (b.id, (b.start_time, b.end_time)))
        .collect();

    let mut moved = 0;
    for block in blocks.iter_mut() {
        let Some(dep_id) = block.depends_on_block_id else {
            continue;
        };
        let Some(&(_, dep_end)) = windows.get(&dep_id) else {
            warn!(
                "block {} depends on unknown block {}; skipping",
                block.id, dep_id
            );
            continue;
        };
        let required_start = dep_end + Duration::minutes(block.buffer_minutes);
        if block.start_time == required_start {
            continue;
        }
        let shift = required_start - block.start_time;
        block.start_time = required_start;
        block.end_time += shift;
        windows.insert(block.id, (block.start_time, block.end_time));
        repo.update_block(block.clone()).await?;
        debug!(
            "moved block {} to {} (dependency {} + {} min buffer)",
            block.id, block.start_time, dep_id, block.buffer_minutes
        );
        moved += 1;
    }
    Ok(moved)
}

/// Schedule one block: resolve its stored court set, collect its encounter
/// scope, and run the timed engine from its effective start.
async fn schedule_block<R>(
    repo: &R,
    block: &ScheduleBlock,
    clear_existing: bool,
    block_ends: &HashMap<BlockId, DateTime<Utc>>,
) -> RepositoryResult<BlockRunResult>
where
    R: FullRepository + ?Sized,
{
    let fail = |message: String| BlockRunResult {
        block_id: block.id,
        label: block.label.clone(),
        success: false,
        message,
        assigned_count: 0,
        end_time: None,
    };

    if block.court_ids.is_empty() {
        return Ok(fail("Block has no courts assigned".into()));
    }
    // A block's court set is fixed at edit time; resolve it directly rather
    // than re-deriving from division court assignments.
    let courts: Vec<Court> = repo
        .fetch_courts(&block.court_ids)
        .await?
        .into_iter()
        .filter(|c| c.is_active)
        .collect();
    if courts.is_empty() {
        return Ok(fail("No valid courts for block".into()));
    }

    let division: Division = match soft(repo.fetch_division(block.division_id).await)? {
        Ok(division) => division,
        Err(message) => return Ok(fail(message)),
    };
    let phase: Option<Phase> = match block.phase_id {
        Some(phase_id) => match soft(repo.fetch_phase(phase_id).await)? {
            Ok(phase) => Some(phase),
            Err(message) => return Ok(fail(message)),
        },
        None => None,
    };

    let mut encounters: Vec<Encounter> = repo
        .encounters_for_division(block.division_id, block.phase_id)
        .await?
        .into_iter()
        .filter(|e| e.status.is_schedulable() && !e.status.is_locked())
        .filter(|e| clear_existing || e.court_id.is_none())
        .collect();
    sort_block_order(&mut encounters);
    // Division-scoped blocks can span phases with their own durations.
    let phases = prefetch_phases(repo, &encounters).await?;

    // Effective start: a dependency already scheduled in this pass gates the
    // block at its actual computed end plus the buffer.
    let start = match block.depends_on_block_id.and_then(|dep| block_ends.get(&dep)) {
        Some(&dep_end) => dep_end + Duration::minutes(block.buffer_minutes),
        None => block.start_time,
    };

    let Some(run) = assign_timed(&encounters, &courts, start, |e| {
        let encounter_phase = match phase.as_ref() {
            Some(p) => Some(p),
            None => e.phase_id.and_then(|id| phases.get(&id)),
        };
        encounter_minutes(block.match_minutes_override, encounter_phase, &division)
    }) else {
        return Ok(fail("No valid courts for block".into()));
    };

    persist_timed_run(repo, &run).await?;
    Ok(BlockRunResult {
        block_id: block.id,
        label: block.label.clone(),
        success: true,
        message: if run.assignments.is_empty() {
            "No encounters to schedule".into()
        } else {
            format!("Scheduled {} encounters", run.assignments.len())
        },
        assigned_count: run.assignments.len(),
        end_time: Some(run.estimated_end),
    })
}

/// Auto-schedule an event's blocks.
///
/// Blocks run in (sort order, start time) order. Failures are isolated per
/// block; the run is wholly failed only when no blocks exist at all. Ends
/// with one conflict validation over the event's blocks.
pub async fn auto_schedule_event<R>(
    repo: &R,
    event_id: EventId,
    options: AutoScheduleOptions,
) -> RepositoryResult<AutoScheduleResult>
where
    R: FullRepository + ?Sized,
{
    if !repo.event_exists(event_id).await? {
        return Ok(AutoScheduleResult::failure(format!(
            "Event {} not found",
            event_id
        )));
    }
    let _guard = lock_event(event_id).await;

    let event_blocks = repo.blocks_for_event(event_id).await?;
    let mut blocks: Vec<ScheduleBlock> = match &options.block_ids {
        Some(ids) => event_blocks
            .iter()
            .filter(|b| ids.contains(&b.id))
            .cloned()
            .collect(),
        None => event_blocks.clone(),
    };
    if blocks.is_empty() {
        return Ok(AutoScheduleResult::failure(format!(
            "No schedule blocks found for event {}",
            event_id
        )));
    }

    if options.clear_existing {
        for block in &blocks {
            let targets: Vec<_> = repo
                .encounters_for_division(block.division_id, block.phase_id)
                .await?
                .into_iter()
                .filter(|e| !e.status.is_locked())
                .filter(|e| e.court_id.is_some() || e.estimated_start.is_some())
                .map(|e| e.id)
                .collect();
            if !targets.is_empty() {
                repo.clear_encounter_schedules(&targets).await?;
            }
        }
    }

    if options.recalculate_dependencies {
        apply_dependency_pass(repo, &mut blocks, &event_blocks).await?;
    }

    let mut block_ends: HashMap<BlockId, DateTime<Utc>> = HashMap::new();
    let mut block_results = Vec::with_capacity(blocks.len());
    let mut encounters_scheduled = 0;
    for block in &blocks {
        let result = match schedule_block(repo, block, options.clear_existing, &block_ends).await {
            Ok(result) => result,
            Err(err) => {
                // Storage fault on one block must not abort the remaining
                // blocks; record it and continue.
                warn!("block {} failed: {}", block.id, err);
                BlockRunResult {
                    block_id: block.id,
                    label: block.label.clone(),
                    success: false,
                    message: err.to_string(),
                    assigned_count: 0,
                    end_time: None,
                }
            }
        };
        if result.success {
            encounters_scheduled += result.assigned_count;
            if let Some(end) = result.end_time {
                block_ends.insert(block.id, end);
            }
        }
        block_results.push(result);
    }

    let blocks_processed = block_results.iter().filter(|r| r.success).count();
    let conflicts = validate_block_set(&repo.blocks_for_event(event_id).await?);
    info!(
        "auto-scheduled event {}: {}/{} blocks, {} encounters, {} conflicts",
        event_id,
        blocks_processed,
        block_results.len(),
        encounters_scheduled,
        conflicts.len()
    );

    Ok(AutoScheduleResult {
        success: true,
        message: format!(
            "Scheduled {} encounters across {} of {} blocks",
            encounters_scheduled,
            blocks_processed,
            block_results.len()
        ),
        blocks_processed,
        encounters_scheduled,
        block_results,
        conflicts,
    })
}
