//! Schedule block repository trait.
//!
//! Blocks are the only entities this engine creates and deletes; everything
//! else is mutated in scheduling-output fields only.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{BlockId, EventId};
use crate::models::ScheduleBlock;

/// Repository trait for schedule block storage.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait BlockRepository: Send + Sync {
    /// Insert a block, assigning its ID.
    ///
    /// The `id` field of the input is ignored; the stored block with its
    /// assigned ID is returned.
    async fn insert_block(&self, block: ScheduleBlock) -> RepositoryResult<ScheduleBlock>;

    /// Fetch a block by ID.
    async fn fetch_block(&self, block_id: BlockId) -> RepositoryResult<ScheduleBlock>;

    /// Overwrite a block.
    async fn update_block(&self, block: ScheduleBlock) -> RepositoryResult<()>;

    /// Delete a block by ID.
    async fn delete_block(&self, block_id: BlockId) -> RepositoryResult<()>;

    /// All blocks of an event, ordered by (sort_order, start_time, ID).
    async fn blocks_for_event(&self, event_id: EventId) -> RepositoryResult<Vec<ScheduleBlock>>;

    /// Null out `depends_on_block_id` on every block referencing the given
    /// block. Used when the referenced block is deleted; the dependency is
    /// cleared, never cascaded.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of blocks whose dependency was cleared
    async fn clear_dependencies_on(&self, block_id: BlockId) -> RepositoryResult<usize>;
}
