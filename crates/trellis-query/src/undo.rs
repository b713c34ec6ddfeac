//! Undo windows for undoable mutations.
//!
//! [`UndoRegistry::start`] registers a [`MutationNotification`] in the
//! notification store and hands back an [`UndoWindow`]. Awaiting the window
//! counts down one [`TICK_MS`] step at a time through the injected clock,
//! dispatching `DecreaseSecond` for each step, and resolves to
//! [`UndoOutcome::Commit`] at zero or when committed early, or to
//! [`UndoOutcome::Cancel`] when cancelled. The entry is removed either way.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;

use trellis_core::{
    Clock, MutationNotification, NotificationAction, NotificationKey, NotificationStore, TICK_MS,
};

/// How an undo window ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    /// Run the deferred mutation.
    Commit,
    /// Abort it.
    Cancel,
    /// A newer window for the same record replaced this one.
    Superseded,
}

type Pending = Arc<Mutex<HashMap<NotificationKey, (u64, oneshot::Sender<UndoOutcome>)>>>;

/// Owner of the in-flight undo windows.
#[derive(Clone)]
pub struct UndoRegistry {
    store: NotificationStore,
    clock: Arc<dyn Clock>,
    pending: Pending,
    generation: Arc<AtomicU64>,
}

impl UndoRegistry {
    /// Registry with an empty notification store.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_store(NotificationStore::notifications(), clock)
    }

    /// Registry over an existing store.
    pub fn with_store(store: NotificationStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            pending: Arc::new(Mutex::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The notification store UI bindings subscribe to.
    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    /// Open a window of `timeout` for a mutation of `resource`/`id`.
    ///
    /// An open window for the same record is superseded.
    pub fn start(&self, id: &str, resource: &str, timeout: Duration) -> UndoWindow {
        let key = NotificationKey::new(id, resource);
        let (tx, rx) = oneshot::channel();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        if let Some((_, previous)) = self.pending.lock().insert(key.clone(), (generation, tx)) {
            let _ = previous.send(UndoOutcome::Superseded);
        }

        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.store.dispatch(NotificationAction::Add(
            MutationNotification::new(id, resource, millis)
                .with_cancel(self.resolver(key.clone(), UndoOutcome::Cancel))
                .with_commit(self.resolver(key.clone(), UndoOutcome::Commit)),
        ));

        UndoWindow {
            millis,
            receiver: rx,
            guard: WindowGuard {
                key,
                generation,
                registry: self.clone(),
                armed: true,
            },
        }
    }

    /// End the window for `key` with [`UndoOutcome::Cancel`].
    pub fn cancel(&self, key: &NotificationKey) -> bool {
        self.resolve(key, UndoOutcome::Cancel)
    }

    /// End the window for `key` with [`UndoOutcome::Commit`] now.
    pub fn commit(&self, key: &NotificationKey) -> bool {
        self.resolve(key, UndoOutcome::Commit)
    }

    /// Keys of the open windows.
    pub fn pending(&self) -> Vec<NotificationKey> {
        self.store.with_state(|s| s.iter().map(MutationNotification::key).collect())
    }

    fn resolve(&self, key: &NotificationKey, outcome: UndoOutcome) -> bool {
        resolve_pending(&self.pending, key, outcome)
    }

    fn resolver(
        &self,
        key: NotificationKey,
        outcome: UndoOutcome,
    ) -> impl Fn() + Send + Sync + 'static {
        let pending = Arc::clone(&self.pending);
        move || {
            resolve_pending(&pending, &key, outcome);
        }
    }

    /// Drop the pending entry for `key` unless a newer window owns it.
    ///
    /// Returns `false` when a newer window has taken the key over.
    fn finish(&self, key: &NotificationKey, generation: u64) -> bool {
        let mut pending = self.pending.lock();
        match pending.get(key) {
            Some((g, _)) if *g != generation => false,
            Some(_) => {
                pending.remove(key);
                true
            }
            None => true,
        }
    }
}

fn resolve_pending(pending: &Pending, key: &NotificationKey, outcome: UndoOutcome) -> bool {
    match pending.lock().remove(key) {
        Some((_, sender)) => {
            tracing::debug!(notification = %key, ?outcome, "undo window resolved");
            sender.send(outcome).is_ok()
        }
        None => false,
    }
}

impl fmt::Debug for UndoRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoRegistry")
            .field("pending", &self.pending.lock().len())
            .finish_non_exhaustive()
    }
}

/// A running undo countdown.
///
/// Dropping the window before it resolves removes its notification, unless
/// a newer window for the same record has replaced it.
pub struct UndoWindow {
    millis: u64,
    receiver: oneshot::Receiver<UndoOutcome>,
    guard: WindowGuard,
}

impl UndoWindow {
    /// Identity of the window.
    pub fn key(&self) -> &NotificationKey {
        &self.guard.key
    }

    /// Count down until committed, cancelled, superseded, or expired.
    pub async fn wait(self) -> UndoOutcome {
        let Self {
            mut millis,
            mut receiver,
            guard,
        } = self;
        let registry = &guard.registry;

        let outcome = loop {
            if millis == 0 {
                break UndoOutcome::Commit;
            }
            let step = Duration::from_millis(millis.min(TICK_MS));
            tokio::select! {
                biased;
                resolved = &mut receiver => {
                    break resolved.unwrap_or(UndoOutcome::Superseded);
                }
                _ = registry.clock.sleep(step) => {
                    registry.store.dispatch(NotificationAction::DecreaseSecond {
                        key: guard.key.clone(),
                        seconds: millis,
                    });
                    millis = millis.saturating_sub(TICK_MS);
                }
            }
        };

        guard.close(outcome);
        outcome
    }
}

impl fmt::Debug for UndoWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoWindow")
            .field("key", &self.guard.key)
            .field("millis", &self.millis)
            .finish_non_exhaustive()
    }
}

/// Cleans up a window's registry entry and notification when it ends,
/// including when its future is dropped mid-countdown.
struct WindowGuard {
    key: NotificationKey,
    generation: u64,
    registry: UndoRegistry,
    armed: bool,
}

impl WindowGuard {
    fn close(mut self, outcome: UndoOutcome) {
        self.armed = false;
        self.registry.finish(&self.key, self.generation);
        if outcome != UndoOutcome::Superseded {
            self.registry
                .store
                .dispatch(NotificationAction::Remove(self.key.clone()));
        }
        tracing::debug!(notification = %self.key, ?outcome, "undo window closed");
    }
}

impl Drop for WindowGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // The pending lock is released before dispatching; store listeners may
        // call back into the registry.
        if self.registry.finish(&self.key, self.generation) {
            self.registry
                .store
                .dispatch(NotificationAction::Remove(self.key.clone()));
            tracing::debug!(notification = %self.key, "undo window abandoned");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use trellis_core::SystemClock;

    fn registry() -> UndoRegistry {
        UndoRegistry::new(Arc::new(SystemClock))
    }

    fn remaining(registry: &UndoRegistry, key: &NotificationKey) -> Option<u64> {
        registry
            .store()
            .with_state(|s| s.get(key).map(|n| n.seconds))
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_commits_on_expiry() {
        let registry = registry();
        let window = registry.start("1", "posts", Duration::from_millis(3000));
        let key = window.key().clone();
        assert_eq!(remaining(&registry, &key), Some(3000));

        let handle = tokio::spawn(window.wait());
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(remaining(&registry, &key), Some(2000));

        assert_eq!(handle.await.unwrap(), UndoOutcome::Commit);
        assert!(registry.store().with_state(|s| s.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_via_notification_callback() {
        let registry = registry();
        let window = registry.start("1", "posts", Duration::from_secs(5));
        let handle = tokio::spawn(window.wait());
        tokio::time::sleep(Duration::from_millis(1200)).await;

        let cancel = registry
            .store()
            .with_state(|s| s.iter().next().map(|n| Arc::clone(&n.cancel)))
            .unwrap();
        cancel();

        assert_eq!(handle.await.unwrap(), UndoOutcome::Cancel);
        assert!(registry.pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_early() {
        let registry = registry();
        let window = registry.start("7", "posts", Duration::from_secs(5));
        let key = window.key().clone();
        let handle = tokio::spawn(window.wait());
        tokio::task::yield_now().await;

        assert!(registry.commit(&key));
        assert!(!registry.commit(&key));
        assert_eq!(handle.await.unwrap(), UndoOutcome::Commit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_supersedes_previous_window() {
        let registry = registry();
        let first = tokio::spawn(registry.start("1", "posts", Duration::from_secs(5)).wait());
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let second = registry.start("1", "posts", Duration::from_secs(5));
        let key = second.key().clone();
        assert_eq!(first.await.unwrap(), UndoOutcome::Superseded);
        assert_eq!(remaining(&registry, &key), Some(5000));
        assert_eq!(registry.pending().len(), 1);

        assert!(registry.cancel(&key));
        assert_eq!(second.wait().await, UndoOutcome::Cancel);
        assert!(registry.pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_commits_immediately() {
        let registry = registry();
        let outcome = registry.start("1", "posts", Duration::ZERO).wait().await;
        assert_eq!(outcome, UndoOutcome::Commit);
        assert!(registry.store().with_state(|s| s.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_window_removes_notification() {
        let registry = registry();
        let window = registry.start("1", "posts", Duration::from_secs(5));
        let key = window.key().clone();

        let waited = tokio::time::timeout(Duration::from_millis(1500), window.wait()).await;
        assert!(waited.is_err());
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(remaining(&registry, &key), None);
        assert!(registry.pending().is_empty());
        assert!(registry.pending.lock().is_empty());
        assert!(!registry.cancel(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_superseded_window_keeps_newer_notification() {
        let registry = registry();
        let first = registry.start("1", "posts", Duration::from_secs(5));
        let second = registry.start("1", "posts", Duration::from_secs(5));
        let key = second.key().clone();

        drop(first);
        assert_eq!(remaining(&registry, &key), Some(5000));
        assert_eq!(registry.pending(), vec![key.clone()]);

        assert!(registry.commit(&key));
        assert_eq!(second.wait().await, UndoOutcome::Commit);
        assert!(registry.pending().is_empty());
    }
}
