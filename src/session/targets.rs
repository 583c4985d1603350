//! Target registry and watcher task.
//!
//! The registry is the session tree's shared view of the browser's
//! targets. Any task may read it; only the watcher task mutates it, by
//! applying the three `Target` lifecycle events in dispatch order:
//!
//! | Event | Mutation |
//! |-------|----------|
//! | `Target.targetCreated` | insert |
//! | `Target.targetInfoChanged` | update in place |
//! | `Target.targetDestroyed` | remove |
//!
//! Waiters (first-page attachment) are woken on every mutation.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::Notify;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::TargetId;
use crate::protocol::envelope::Envelope;
use crate::protocol::target::{TargetDestroyedParams, TargetInfo, TargetInfoParams};
use crate::transport::EventStream;

// ============================================================================
// TargetRegistry
// ============================================================================

/// Shared registry of the browser's targets.
pub struct TargetRegistry {
    /// Target metadata by id.
    entries: Mutex<FxHashMap<TargetId, TargetInfo>>,
    /// Woken on every mutation.
    changed: Notify,
}

impl TargetRegistry {
    /// Creates an empty registry.
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
            changed: Notify::new(),
        }
    }

    /// Returns a snapshot of all known targets.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TargetInfo> {
        self.entries.lock().values().cloned().collect()
    }

    /// Returns one target's metadata, if known.
    #[must_use]
    pub fn get(&self, target_id: &TargetId) -> Option<TargetInfo> {
        self.entries.lock().get(target_id).cloned()
    }

    /// Returns the number of known targets.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if no targets are known.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Inserts or updates a target entry.
    pub(crate) fn upsert(&self, info: TargetInfo) {
        self.entries.lock().insert(info.target_id.clone(), info);
        self.changed.notify_waiters();
    }

    /// Removes a target entry.
    pub(crate) fn remove(&self, target_id: &TargetId) {
        self.entries.lock().remove(target_id);
        self.changed.notify_waiters();
    }

    /// Marks a target as attached.
    pub(crate) fn mark_attached(&self, target_id: &TargetId) {
        if let Some(entry) = self.entries.lock().get_mut(target_id) {
            entry.attached = true;
        }
        self.changed.notify_waiters();
    }

    /// Returns an unattached page target, if one is known.
    fn unattached_page(&self) -> Option<TargetId> {
        self.entries
            .lock()
            .values()
            .find(|info| info.is_page() && !info.attached)
            .map(|info| info.target_id.clone())
    }

    /// Waits until an unattached page target is known.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if none appears within `wait`.
    pub(crate) async fn wait_for_unattached_page(&self, wait: Duration) -> Result<TargetId> {
        let deadline = Instant::now() + wait;

        loop {
            // Register for the next notification before checking, so a
            // mutation between the check and the await cannot be missed.
            let notified = self.changed.notified();

            if let Some(target_id) = self.unattached_page() {
                return Ok(target_id);
            }

            if timeout_at(deadline, notified).await.is_err() {
                return Err(Error::timeout(
                    "wait for page target",
                    wait.as_millis() as u64,
                ));
            }
        }
    }
}

impl std::fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetRegistry")
            .field("len", &self.len())
            .finish()
    }
}

// ============================================================================
// Watcher Task
// ============================================================================

/// Spawns the task that applies target lifecycle events to the registry.
///
/// The watcher is the registry's only mutator. It stops when the scope is
/// cancelled or the event streams end (transport closed).
pub(crate) fn spawn_target_watcher(
    registry: Arc<TargetRegistry>,
    mut created: EventStream,
    mut info_changed: EventStream,
    mut destroyed: EventStream,
    scope: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = scope.cancelled() => break,

                event = created.next() => match event {
                    Some(envelope) => apply_target_info(&registry, &envelope),
                    None => break,
                },

                event = info_changed.next() => match event {
                    Some(envelope) => apply_target_info(&registry, &envelope),
                    None => break,
                },

                event = destroyed.next() => match event {
                    Some(envelope) => apply_destroyed(&registry, &envelope),
                    None => break,
                },
            }
        }

        debug!("Target watcher terminated");
    });
}

/// Applies `targetCreated` / `targetInfoChanged` to the registry.
fn apply_target_info(registry: &TargetRegistry, envelope: &Envelope) {
    match serde_json::from_value::<TargetInfoParams>(envelope.params_or_null().clone()) {
        Ok(params) => {
            trace!(
                target = %params.target_info.target_id,
                target_type = %params.target_info.target_type,
                url = %params.target_info.url,
                "Target upserted"
            );
            registry.upsert(params.target_info);
        }
        Err(e) => warn!(error = %e, "Malformed target lifecycle event"),
    }
}

/// Applies `targetDestroyed` to the registry.
fn apply_destroyed(registry: &TargetRegistry, envelope: &Envelope) {
    match serde_json::from_value::<TargetDestroyedParams>(envelope.params_or_null().clone()) {
        Ok(params) => {
            trace!(target = %params.target_id, "Target removed");
            registry.remove(&params.target_id);
        }
        Err(e) => warn!(error = %e, "Malformed targetDestroyed event"),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: &str, attached: bool) -> TargetInfo {
        TargetInfo {
            target_id: TargetId::from(id),
            target_type: "page".to_string(),
            attached,
            url: "about:blank".to_string(),
            title: String::new(),
        }
    }

    #[test]
    fn test_upsert_and_snapshot() {
        let registry = TargetRegistry::new();
        assert!(registry.is_empty());

        registry.upsert(page("A", false));
        registry.upsert(page("B", false));
        assert_eq!(registry.len(), 2);

        // Upsert with the same id mutates in place.
        let mut updated = page("A", false);
        updated.url = "https://example.com".to_string();
        registry.upsert(updated);
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get(&TargetId::from("A")).expect("entry").url,
            "https://example.com"
        );
    }

    #[test]
    fn test_remove() {
        let registry = TargetRegistry::new();
        registry.upsert(page("A", false));
        registry.remove(&TargetId::from("A"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unattached_page_skips_attached_and_non_pages() {
        let registry = TargetRegistry::new();
        registry.upsert(page("attached", true));
        registry.upsert(TargetInfo {
            target_id: TargetId::from("worker"),
            target_type: "service_worker".to_string(),
            attached: false,
            url: String::new(),
            title: String::new(),
        });
        assert!(registry.unattached_page().is_none());

        registry.upsert(page("fresh", false));
        assert_eq!(
            registry.unattached_page(),
            Some(TargetId::from("fresh"))
        );
    }

    #[test]
    fn test_mark_attached() {
        let registry = TargetRegistry::new();
        registry.upsert(page("A", false));
        registry.mark_attached(&TargetId::from("A"));
        assert!(registry.unattached_page().is_none());
    }

    #[tokio::test]
    async fn test_wait_for_page_resolves_on_upsert() {
        let registry = Arc::new(TargetRegistry::new());

        let waiter = tokio::spawn({
            let registry = Arc::clone(&registry);
            async move {
                registry
                    .wait_for_unattached_page(Duration::from_secs(5))
                    .await
            }
        });

        tokio::task::yield_now().await;
        registry.upsert(page("late", false));

        let target_id = waiter.await.expect("join").expect("wait");
        assert_eq!(target_id, TargetId::from("late"));
    }

    #[tokio::test]
    async fn test_wait_for_page_times_out() {
        let registry = TargetRegistry::new();
        let err = registry
            .wait_for_unattached_page(Duration::from_millis(20))
            .await
            .expect_err("timeout");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_apply_target_info_ignores_malformed_params() {
        let registry = TargetRegistry::new();
        let envelope: Envelope =
            serde_json::from_str(r#"{"method": "Target.targetCreated", "params": {"bogus": 1}}"#)
                .expect("parse");

        apply_target_info(&registry, &envelope);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_apply_destroyed() {
        let registry = TargetRegistry::new();
        registry.upsert(page("gone", false));

        let envelope: Envelope = serde_json::from_str(
            r#"{"method": "Target.targetDestroyed", "params": {"targetId": "gone"}}"#,
        )
        .expect("parse");

        apply_destroyed(&registry, &envelope);
        assert!(registry.is_empty());
    }
}
