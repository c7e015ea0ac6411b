//! Domain entities for the scheduling engine.
//!
//! Entities reference each other by ID only. The original system navigated a
//! cyclic object graph (division <-> encounters <-> courts <-> blocks); here
//! every edge is an identifier resolved through repository queries, which
//! keeps the entities serializable and cheap to clone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{
    BlockId, CourtGroupId, CourtId, DivisionCourtAssignmentId, DivisionId, EncounterId, EventId,
    PhaseId, UnitId, UserId,
};

/// Fallback estimated match duration when neither the phase nor the division
/// configures one.
pub const DEFAULT_MATCH_MINUTES: i64 = 20;

/// A physical court belonging to one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Court {
    pub id: CourtId,
    pub event_id: EventId,
    /// Display label, e.g. "Court 3" or "Center Court".
    pub label: String,
    pub is_active: bool,
    /// Tie-break key for greedy assignment; lower sorts first.
    pub sort_order: i32,
    /// Encounter currently being played on this court, if any.
    pub occupied_by: Option<EncounterId>,
}

/// A competitive division within an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Division {
    pub id: DivisionId,
    pub event_id: EventId,
    pub name: String,
    /// Default estimated match duration in minutes for this division.
    pub default_match_minutes: i64,
}

/// Kind of sub-stage within a division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    PoolPlay,
    Bracket,
    Consolation,
    Other,
}

impl PhaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::PoolPlay => "Pool Play",
            PhaseKind::Bracket => "Bracket",
            PhaseKind::Consolation => "Consolation",
            PhaseKind::Other => "Phase",
        }
    }
}

/// A stage of a division (pool play, bracket, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub id: PhaseId,
    pub division_id: DivisionId,
    pub name: Option<String>,
    pub kind: PhaseKind,
    /// Overrides the division's estimated match duration when set.
    pub match_minutes: Option<i64>,
    pub start_time: Option<DateTime<Utc>>,
    /// Computed by `calculate_phase_times`; not a source of truth.
    pub estimated_end: Option<DateTime<Utc>>,
}

impl Phase {
    /// Human-readable phase label: explicit name, else the kind.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.kind.as_str().to_string(),
        }
    }
}

/// Lifecycle status of an encounter.
///
/// The original system stored these as free-form strings; a closed enum makes
/// the scheduler's exclusion rules exhaustively checkable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterStatus {
    /// Participants not yet determined (e.g. bracket slot awaiting a winner).
    NotPlayable,
    Scheduled,
    InProgress,
    Completed,
    Bye,
    Cancelled,
}

impl EncounterStatus {
    /// Whether the encounter should receive a court/time assignment at all.
    /// Byes and cancellations are never scheduled.
    pub fn is_schedulable(&self) -> bool {
        !matches!(self, EncounterStatus::Bye | EncounterStatus::Cancelled)
    }

    /// Whether the encounter's existing assignment must not be cleared or
    /// overwritten by an auto-scheduling run.
    pub fn is_locked(&self) -> bool {
        matches!(self, EncounterStatus::Completed | EncounterStatus::InProgress)
    }
}

/// A single match between competitive units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encounter {
    pub id: EncounterId,
    pub division_id: DivisionId,
    pub phase_id: Option<PhaseId>,
    /// Pool the encounter belongs to, when the phase is pool play.
    pub pool_id: Option<i64>,
    pub round_number: i32,
    pub encounter_number: i32,
    pub status: EncounterStatus,
    /// Competing units; normally two, one for a bye.
    pub unit_ids: Vec<UnitId>,
    // Scheduling outputs. These are the only fields this engine mutates.
    pub court_id: Option<CourtId>,
    pub estimated_start: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<i64>,
    pub estimated_end: Option<DateTime<Utc>>,
}

impl Encounter {
    /// Ordering key for division-level assignment: round, then encounter
    /// number, with the ID as a final deterministic tie-break.
    pub fn division_order_key(&self) -> (i32, i32, EncounterId) {
        (self.round_number, self.encounter_number, self.id)
    }

    /// Ordering key for phase/block-level assignment: pool, then round, then
    /// encounter number. Encounters without a pool sort first.
    pub fn block_order_key(&self) -> (i64, i32, i32, EncounterId) {
        (
            self.pool_id.unwrap_or(i64::MIN),
            self.round_number,
            self.encounter_number,
            self.id,
        )
    }
}

/// A named set of courts, reusable across divisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourtGroup {
    pub id: CourtGroupId,
    pub event_id: EventId,
    pub name: String,
    pub court_ids: Vec<CourtId>,
}

/// Binds a court group to a division (optionally narrowed to one phase) with
/// a priority ordering. Resolved by the court pool resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivisionCourtAssignment {
    pub id: DivisionCourtAssignmentId,
    pub division_id: DivisionId,
    /// When set, the assignment applies only to this phase.
    pub phase_id: Option<PhaseId>,
    pub court_group_id: CourtGroupId,
    /// Lower priority resolves first.
    pub priority: i32,
    pub is_active: bool,
}

/// The scheduling engine's primary control object: a time-boxed, court-scoped
/// wave of encounters for one division/phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleBlock {
    pub id: BlockId,
    pub event_id: EventId,
    pub division_id: DivisionId,
    pub phase_id: Option<PhaseId>,
    pub label: String,
    /// Court set fixed at block-edit time; not re-derived at scheduling time.
    pub court_ids: Vec<CourtId>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub sort_order: i32,
    /// Block whose end gates this block's start, if any.
    pub depends_on_block_id: Option<BlockId>,
    /// Minimum minutes between the dependency's end and this block's start.
    pub buffer_minutes: i64,
    /// Overrides phase/division match duration for this block when set.
    pub match_minutes_override: Option<i64>,
    /// Cached count of schedulable encounters in scope, snapshotted at
    /// create/update time. Never a source of truth.
    pub encounter_count: usize,
}

impl ScheduleBlock {
    /// Processing order for the auto-scheduler and the dependency pass:
    /// sort order, then start time, then ID.
    pub fn processing_key(&self) -> (i32, DateTime<Utc>, BlockId) {
        (self.sort_order, self.start_time, self.id)
    }
}

/// A competitive unit (player, pair, or team) registered in an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub event_id: EventId,
    pub name: String,
    pub member_user_ids: Vec<UserId>,
}
