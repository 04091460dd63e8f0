//! Poison recovery for the std locks guarding the pool map and the config tree.
//!
//! Every critical section in this crate leaves its state consistent before it
//! can panic (map inserts, drains and tree swaps are single calls), so the
//! guard of a poisoned lock is taken over as-is.

use std::sync::LockResult;

use tracing::warn;

/// Unwrap a lock result, taking over the guard if a previous holder panicked.
///
/// `site` names the caller in the log, e.g. `"pool.resolve"`.
pub(crate) fn recover<G>(result: LockResult<G>, site: &'static str) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(site, "Cache lock poisoned by a panicked holder, reusing its state");
        poisoned.into_inner()
    })
}
