//! Public API surface for the scheduling engine.
//!
//! This file consolidates the identifier newtypes and re-exports the
//! structured result types produced by the scheduler and service layers. All
//! types derive Serialize/Deserialize so the upstream request layer can
//! render them directly.

pub use crate::scheduler::assignment::{CourtUsage, EncounterAssignment, TimedRun};
pub use crate::scheduler::auto::{
    AssignDivisionOptions, AssignDivisionResult, AssignPhaseResult, AutoScheduleOptions,
    AutoScheduleResult, BlockRunResult, PhaseTimesResult,
};
pub use crate::scheduler::blocks::{BlockUpdate, NewBlock};
pub use crate::scheduler::conflicts::{Conflict, ConflictKind, ConflictReport};
pub use crate::services::player_schedule::{ItineraryEntry, PlayerItinerary};
pub use crate::services::timeline::{
    CourtTimeline, DivisionSummary, EventTimeline, PaletteVersion, TimeSlot,
};

use crate::define_id_type;

define_id_type!(i64, EventId);
define_id_type!(i64, CourtId);
define_id_type!(i64, CourtGroupId);
define_id_type!(i64, DivisionId);
define_id_type!(i64, DivisionCourtAssignmentId);
define_id_type!(i64, PhaseId);
define_id_type!(i64, EncounterId);
define_id_type!(i64, BlockId);
define_id_type!(i64, UnitId);
define_id_type!(i64, UserId);
