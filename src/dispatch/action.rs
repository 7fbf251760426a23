//! Gesture-to-action registry.
//!
//! Actions are supplied by the host; the registry only maps each
//! `GestureId` to at most one callable.

use std::collections::BTreeMap;
use std::thread;

use tracing::{debug, error};

use crate::hand::GestureId;

/// A side effect bound to a gesture.
pub trait Action: Send {
    /// Run the action for `gesture`.  Errors are reported by the loop and
    /// never retried.
    fn invoke(&mut self, gesture: GestureId) -> anyhow::Result<()>;
}

impl<F> Action for F
where
    F: FnMut() -> anyhow::Result<()> + Send,
{
    fn invoke(&mut self, _gesture: GestureId) -> anyhow::Result<()> {
        self()
    }
}

/// Runs the wrapped action on a fresh worker thread.
///
/// The loop sees the invocation as successful once the worker has been
/// spawned; failures inside the worker are logged there.
pub struct Detached<A> {
    inner: A,
}

impl<A> Detached<A>
where
    A: Action + Clone + 'static,
{
    pub fn new(inner: A) -> Self {
        Self { inner }
    }
}

impl<A> Action for Detached<A>
where
    A: Action + Clone + 'static,
{
    fn invoke(&mut self, gesture: GestureId) -> anyhow::Result<()> {
        let mut inner = self.inner.clone();
        thread::Builder::new()
            .name(format!("action-{}", gesture.as_str()))
            .spawn(move || {
                if let Err(e) = inner.invoke(gesture) {
                    error!("Detached action for {} failed: {:#}", gesture, e);
                }
            })?;
        debug!("Spawned detached action for {}", gesture);
        Ok(())
    }
}

/// Registered actions keyed by gesture.
#[derive(Default)]
pub struct ActionRegistry {
    actions: BTreeMap<GestureId, Box<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an action to a gesture, replacing any previous binding.
    pub fn register<A>(&mut self, gesture: GestureId, action: A)
    where
        A: Action + 'static,
    {
        self.actions.insert(gesture, Box::new(action));
    }

    /// Remove a binding.  Returns true if one was removed.
    pub fn unregister(&mut self, gesture: GestureId) -> bool {
        self.actions.remove(&gesture).is_some()
    }

    pub fn is_registered(&self, gesture: GestureId) -> bool {
        self.actions.contains_key(&gesture)
    }

    pub(crate) fn get_mut(&mut self, gesture: GestureId) -> Option<&mut (dyn Action + 'static)> {
        self.actions.get_mut(&gesture).map(|a| a.as_mut())
    }

    /// Registered gestures, in `GestureId` order.
    pub fn gestures(&self) -> impl Iterator<Item = GestureId> + '_ {
        self.actions.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    #[test]
    fn test_register_and_invoke() {
        let count = Arc::new(AtomicU32::new(0));
        let mut registry = ActionRegistry::new();
        let c = count.clone();
        registry.register(GestureId::Like, move || -> anyhow::Result<()> {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(registry.is_registered(GestureId::Like));
        assert!(!registry.is_registered(GestureId::Wave));
        registry
            .get_mut(GestureId::Like)
            .unwrap()
            .invoke(GestureId::Like)
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ActionRegistry::new();
        registry.register(GestureId::Ok, || -> anyhow::Result<()> { Ok(()) });
        registry.register(GestureId::Ok, || -> anyhow::Result<()> { anyhow::bail!("second") });
        assert_eq!(registry.len(), 1);
        let result = registry.get_mut(GestureId::Ok).unwrap().invoke(GestureId::Ok);
        assert!(result.is_err());
    }

    #[test]
    fn test_unregister() {
        let mut registry = ActionRegistry::new();
        assert!(registry.is_empty());
        registry.register(GestureId::Call, || -> anyhow::Result<()> { Ok(()) });
        assert!(registry.unregister(GestureId::Call));
        assert!(!registry.unregister(GestureId::Call));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_gestures_sorted() {
        let mut registry = ActionRegistry::new();
        registry.register(GestureId::Wave, || -> anyhow::Result<()> { Ok(()) });
        registry.register(GestureId::VSign, || -> anyhow::Result<()> { Ok(()) });
        let gestures: Vec<_> = registry.gestures().collect();
        assert_eq!(gestures, vec![GestureId::VSign, GestureId::Wave]);
    }

    #[derive(Clone)]
    struct Notify(mpsc::Sender<GestureId>);

    impl Action for Notify {
        fn invoke(&mut self, gesture: GestureId) -> anyhow::Result<()> {
            self.0.send(gesture)?;
            Ok(())
        }
    }

    #[test]
    fn test_detached_runs_on_worker() {
        let (tx, rx) = mpsc::channel();
        let mut action = Detached::new(Notify(tx));
        action.invoke(GestureId::Wave).unwrap();
        let got = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(got, GestureId::Wave);
    }
}
