//! Reducer store with change listeners.
//!
//! A [`Store`] owns a state value and a pure reducer. Actions are applied
//! strictly in dispatch order; after each action every registered listener
//! receives the new state. This is the observer contract UI bindings use to
//! re-render, and the undo machinery uses to drive countdowns.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Reducer<S, A> = Arc<dyn Fn(&S, A) -> S + Send + Sync>;
type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;

struct Inner<S, A> {
    state: Mutex<S>,
    reducer: Reducer<S, A>,
    listeners: Mutex<BTreeMap<ListenerId, Listener<S>>>,
    next_id: AtomicU64,
}

/// Shared, cloneable reducer store.
pub struct Store<S, A> {
    inner: Arc<Inner<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> Store<S, A>
where
    S: Clone + Send + 'static,
    A: 'static,
{
    /// Create a store from an initial state and a reducer.
    pub fn new(initial: S, reducer: impl Fn(&S, A) -> S + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(initial),
                reducer: Arc::new(reducer),
                listeners: Mutex::new(BTreeMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> S {
        self.inner.state.lock().clone()
    }

    /// Read the current state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.state.lock())
    }

    /// Apply an action, then notify listeners with the new state.
    ///
    /// The state lock is held while reducing so concurrent dispatches are
    /// serialised; listeners run after it is released and may dispatch.
    pub fn dispatch(&self, action: A) {
        let snapshot = {
            let mut state = self.inner.state.lock();
            let next = (self.inner.reducer)(&*state, action);
            *state = next;
            state.clone()
        };
        let listeners: Vec<Listener<S>> = self.inner.listeners.lock().values().cloned().collect();
        for listener in listeners {
            listener(&snapshot);
        }
    }

    /// Register a listener called after every dispatch.
    pub fn subscribe(&self, listener: impl Fn(&S) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.lock().insert(id, Arc::new(listener));
        id
    }

    /// Remove a listener; returns whether it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.listeners.lock().remove(&id).is_some()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

impl<S: fmt::Debug, A> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.inner.state.lock())
            .field("listeners", &self.inner.listeners.lock().len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::notification::{MutationNotification, NotificationAction, NotificationStore};
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug)]
    enum Counter {
        Add(i64),
        Reset,
    }

    fn counter_store() -> Store<i64, Counter> {
        Store::new(0, |state: &i64, action: Counter| match action {
            Counter::Add(n) => state + n,
            Counter::Reset => 0,
        })
    }

    #[test]
    fn test_dispatch_applies_in_order() {
        let store = counter_store();
        store.dispatch(Counter::Add(2));
        store.dispatch(Counter::Add(3));
        assert_eq!(store.state(), 5);
        store.dispatch(Counter::Reset);
        assert_eq!(store.state(), 0);
    }

    #[test]
    fn test_listeners_see_new_state() {
        let store = counter_store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |s| sink.lock().push(*s));

        store.dispatch(Counter::Add(1));
        store.dispatch(Counter::Add(1));
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let store = counter_store();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.dispatch(Counter::Add(1));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.dispatch(Counter::Add(1));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_listener_may_dispatch() {
        let store = counter_store();
        let inner = store.clone();
        store.subscribe(move |s| {
            if *s == 1 {
                inner.dispatch(Counter::Add(10));
            }
        });
        store.dispatch(Counter::Add(1));
        assert_eq!(store.state(), 11);
    }

    #[test]
    fn test_clones_share_state() {
        let store = counter_store();
        let other = store.clone();
        other.dispatch(Counter::Add(4));
        assert_eq!(store.with_state(|s| *s), 4);
    }

    #[test]
    fn test_notification_store() {
        let store = NotificationStore::notifications();
        store.dispatch(NotificationAction::Add(MutationNotification::new("1", "posts", 5000)));
        assert_eq!(store.with_state(|s| s.len()), 1);
    }

    #[tokio::test]
    async fn test_dispatch_across_tasks() {
        let store = counter_store();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let s = store.clone();
            handles.push(tokio::spawn(async move { s.dispatch(Counter::Add(1)) }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.state(), 8);
    }
}
