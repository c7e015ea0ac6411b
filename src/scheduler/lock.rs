//! Per-event serialization of scheduling operations.
//!
//! Courts, blocks, and encounters are shared mutable state with no optimistic
//! locking in storage; two concurrent auto-scheduling runs against the same
//! event would interleave their read/write passes and produce inconsistent
//! assignments. Every mutating operation therefore takes the event's lock for
//! the duration of the call.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::api::EventId;

static EVENT_LOCKS: OnceLock<Mutex<HashMap<EventId, Arc<AsyncMutex<()>>>>> = OnceLock::new();

/// Acquire the scheduling lock for an event, waiting if another scheduling
/// operation on the same event is in flight. The guard is held across the
/// caller's read/write passes.
pub async fn lock_event(event_id: EventId) -> OwnedMutexGuard<()> {
    let lock = {
        let registry = EVENT_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
        let mut map = registry.lock();
        Arc::clone(map.entry(event_id).or_insert_with(|| Arc::new(AsyncMutex::new(()))))
    };
    lock.lock_owned().await
}
