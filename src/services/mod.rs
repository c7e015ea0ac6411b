//! Read-only projection services over the scheduling state.
//!
//! These services aggregate blocks, courts, divisions, and encounters into
//! presentation-ready views. They never mutate scheduling state; the write
//! paths live in [`crate::scheduler`].

pub mod player_schedule;

pub mod timeline;

pub use player_schedule::{format_time_until, get_player_schedule, get_player_schedule_at};
pub use timeline::{division_color, get_timeline};
