//! Court and time scheduling core.
//!
//! Composition, leaves first: the court pool resolver and duration
//! calculator feed the greedy assignment engine; the auto-scheduler drives
//! the engine across schedule blocks with the dependency pass applied first;
//! the conflict validator scans the resulting block state read-only.

pub mod assignment;
pub mod auto;
pub mod blocks;
pub mod conflicts;
pub mod courts;
pub mod lock;

pub use assignment::{assign_round_robin, assign_timed};
pub use auto::{
    assign_division, assign_phase, auto_schedule_event, calculate_phase_times,
    clear_division_assignments,
};
pub use blocks::{create_block, delete_block, update_block};
pub use conflicts::{validate_block_set, validate_event_blocks};
pub use courts::{court_pool_with_fallback, encounter_minutes, resolve_courts_for_division};
