//! Repository trait definitions.
//!
//! The engine consumes persistent storage through narrow per-concern traits;
//! `FullRepository` is the convenience bound for call sites that need all of
//! them. Implementations live in [`crate::db::repositories`].

pub mod blocks;
pub mod courts;
pub mod encounters;
pub mod error;
pub mod events;

pub use blocks::BlockRepository;
pub use courts::CourtRepository;
pub use encounters::{EncounterRepository, EncounterScheduleUpdate};
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use events::EventRepository;

/// Combined repository bound for the scheduler and services.
pub trait FullRepository:
    CourtRepository + EncounterRepository + EventRepository + BlockRepository
{
}

impl<T> FullRepository for T where
    T: CourtRepository + EncounterRepository + EventRepository + BlockRepository
{
}
