//! Schedule block CRUD with referential validation.
//!
//! Blocks are created and edited exclusively through this module. Creation
//! validates that the division belongs to the target event, the phase (if
//! any) belongs to the division, and the dependency block (if any) belongs to
//! the same event. Deleting a block clears the dependency reference on any
//! block that pointed at it; it never cascades.

use chrono::{DateTime, Duration, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::api::{BlockId, CourtId, DivisionId, EventId, PhaseId};
use crate::db::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};
use crate::models::{Division, Phase, ScheduleBlock};

/// Default block window length when no end time is supplied.
pub const DEFAULT_BLOCK_WINDOW_HOURS: i64 = 2;

/// Fields for creating a schedule block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBlock {
    pub event_id: EventId,
    pub division_id: DivisionId,
    #[serde(default)]
    pub phase_id: Option<PhaseId>,
    /// Auto-derived from division and phase names when omitted.
    #[serde(default)]
    pub label: Option<String>,
    pub court_ids: Vec<CourtId>,
    pub start_time: DateTime<Utc>,
    /// Defaults to `start_time` + 2 hours when omitted.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub depends_on_block_id: Option<BlockId>,
    #[serde(default)]
    pub buffer_minutes: i64,
    #[serde(default)]
    pub match_minutes_override: Option<i64>,
}

/// Partial update for a schedule block. `None` leaves a field untouched; the
/// double-`Option` fields distinguish "leave alone" from "clear".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockUpdate {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub court_ids: Option<Vec<CourtId>>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default, with = "double_option")]
    pub depends_on_block_id: Option<Option<BlockId>>,
    #[serde(default)]
    pub buffer_minutes: Option<i64>,
    #[serde(default, with = "double_option")]
    pub match_minutes_override: Option<Option<i64>>,
}

/// Serde helper for the double-`Option` fields: an absent key deserializes
/// to `None` (leave alone) via `#[serde(default)]`, an explicit `null` to
/// `Some(None)` (clear).
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Some(Option::deserialize(deserializer)?))
    }
}

fn validation(message: String, operation: &str) -> RepositoryError {
    RepositoryError::validation(message, ErrorContext::new(operation).with_entity("block"))
}

fn derive_label(division: &Division, phase: Option<&Phase>) -> String {
    match phase {
        Some(phase) => format!("{} - {}", division.name, phase.display_name()),
        None => division.name.clone(),
    }
}

/// Count of schedulable encounters in the block's division/phase scope.
/// A cached snapshot only; it is not kept in sync afterwards.
async fn snapshot_encounter_count<R>(
    repo: &R,
    division_id: DivisionId,
    phase_id: Option<PhaseId>,
) -> RepositoryResult<usize>
where
    R: FullRepository + ?Sized,
{
    let encounters = repo.encounters_for_division(division_id, phase_id).await?;
    Ok(encounters
        .iter()
        .filter(|e| e.status.is_schedulable())
        .count())
}

async fn validate_references<R>(
    repo: &R,
    event_id: EventId,
    division_id: DivisionId,
    phase_id: Option<PhaseId>,
    depends_on: Option<BlockId>,
    operation: &str,
) -> RepositoryResult<(Division, Option<Phase>)>
where
    R: FullRepository + ?Sized,
{
    let division = repo.fetch_division(division_id).await?;
    if division.event_id != event_id {
        return Err(validation(
            format!(
                "Division {} does not belong to event {}",
                division_id, event_id
            ),
            operation,
        ));
    }

    let phase = match phase_id {
        Some(phase_id) => {
            let phase = repo.fetch_phase(phase_id).await?;
            if phase.division_id != division_id {
                return Err(validation(
                    format!(
                        "Phase {} does not belong to division {}",
                        phase_id, division_id
                    ),
                    operation,
                ));
            }
            Some(phase)
        }
        None => None,
    };

    if let Some(dep_id) = depends_on {
        let dependency = repo.fetch_block(dep_id).await?;
        if dependency.event_id != event_id {
            return Err(validation(
                format!(
                    "Dependency block {} does not belong to event {}",
                    dep_id, event_id
                ),
                operation,
            ));
        }
    }

    Ok((division, phase))
}

/// Create a schedule block.
pub async fn create_block<R>(repo: &R, new: NewBlock) -> RepositoryResult<ScheduleBlock>
where
    R: FullRepository + ?Sized,
{
    let (division, phase) = validate_references(
        repo,
        new.event_id,
        new.division_id,
        new.phase_id,
        new.depends_on_block_id,
        "create_block",
    )
    .await?;

    let label = match new.label.filter(|l| !l.trim().is_empty()) {
        Some(label) => label,
        None => derive_label(&division, phase.as_ref()),
    };
    let end_time = new
        .end_time
        .unwrap_or(new.start_time + Duration::hours(DEFAULT_BLOCK_WINDOW_HOURS));
    if end_time <= new.start_time {
        return Err(validation(
            format!("Block end {} is not after start {}", end_time, new.start_time),
            "create_block",
        ));
    }
    let encounter_count = snapshot_encounter_count(repo, new.division_id, new.phase_id).await?;

    let block = repo
        .insert_block(ScheduleBlock {
            id: BlockId::new(0),
            event_id: new.event_id,
            division_id: new.division_id,
            phase_id: new.phase_id,
            label,
            court_ids: new.court_ids,
            start_time: new.start_time,
            end_time,
            sort_order: new.sort_order,
            depends_on_block_id: new.depends_on_block_id,
            buffer_minutes: new.buffer_minutes.max(0),
            match_minutes_override: new.match_minutes_override,
            encounter_count,
        })
        .await?;

    info!(
        "created block {} \"{}\" for division {} ({} encounters in scope)",
        block.id, block.label, block.division_id, block.encounter_count
    );
    Ok(block)
}

/// Update a schedule block. Division/phase scope is fixed at creation; this
/// edits the window, courts, ordering, and dependency.
pub async fn update_block<R>(
    repo: &R,
    block_id: BlockId,
    update: BlockUpdate,
) -> RepositoryResult<ScheduleBlock>
where
    R: FullRepository + ?Sized,
{
    let mut block = repo.fetch_block(block_id).await?;

    if let Some(label) = update.label.filter(|l| !l.trim().is_empty()) {
        block.label = label;
    }
    if let Some(court_ids) = update.court_ids {
        block.court_ids = court_ids;
    }
    if let Some(start_time) = update.start_time {
        block.start_time = start_time;
    }
    if let Some(end_time) = update.end_time {
        block.end_time = end_time;
    }
    if let Some(sort_order) = update.sort_order {
        block.sort_order = sort_order;
    }
    if let Some(depends_on) = update.depends_on_block_id {
        if depends_on == Some(block_id) {
            return Err(validation(
                format!("Block {} cannot depend on itself", block_id),
                "update_block",
            ));
        }
        block.depends_on_block_id = depends_on;
    }
    if let Some(buffer_minutes) = update.buffer_minutes {
        block.buffer_minutes = buffer_minutes.max(0);
    }
    if let Some(override_minutes) = update.match_minutes_override {
        block.match_minutes_override = override_minutes;
    }

    if block.end_time <= block.start_time {
        return Err(validation(
            format!(
                "Block end {} is not after start {}",
                block.end_time, block.start_time
            ),
            "update_block",
        ));
    }

    // Re-validate references the update may have changed.
    validate_references(
        repo,
        block.event_id,
        block.division_id,
        block.phase_id,
        block.depends_on_block_id,
        "update_block",
    )
    .await?;

    // Refresh the cached snapshot while we are writing anyway.
    block.encounter_count =
        snapshot_encounter_count(repo, block.division_id, block.phase_id).await?;

    repo.update_block(block.clone()).await?;
    Ok(block)
}

/// Delete a schedule block, clearing the dependency reference on any block
/// that depended on it.
///
/// # Returns
/// * `Ok(usize)` - Number of dependent blocks whose reference was cleared
pub async fn delete_block<R>(repo: &R, block_id: BlockId) -> RepositoryResult<usize>
where
    R: FullRepository + ?Sized,
{
    // Fetch first so a missing block surfaces as NotFound.
    let block = repo.fetch_block(block_id).await?;
    let cleared = repo.clear_dependencies_on(block_id).await?;
    repo.delete_block(block_id).await?;
    info!(
        "deleted block {} \"{}\"; cleared {} dependent reference(s)",
        block_id, block.label, cleared
    );
    Ok(cleared)
}
