//! Explicit release of tracked instances.
//!
//! A container records every disposable singleton or scoped instance it
//! creates, and every lifetime scope spawned from it, in registration
//! order. Disposing the container walks that record oldest first.
//!
//! Instances are owned strongly: the container already keeps them alive
//! in its slots, so tracking adds no extra lifetime. Scopes are tracked
//! weakly; a scope that was already dropped has disposed itself and is
//! skipped.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::trace;

use crate::container::ContainerInner;
use crate::instance::Instance;
use crate::key::DependencyKey;

/// Release hook for components that hold resources.
///
/// Called at most once per tracked instance, when the container that
/// created it is disposed or dropped.
///
/// ```
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use tarkib_container::dispose::Dispose;
///
/// struct Pool { closed: AtomicBool }
///
/// impl Dispose for Pool {
///     fn dispose(&self) {
///         self.closed.store(true, Ordering::SeqCst);
///     }
/// }
/// ```
pub trait Dispose: Send + Sync {
    fn dispose(&self);
}

/// Erased dispose call for one component type.
pub type DisposeFn = Arc<dyn Fn(&Instance) + Send + Sync>;

pub(crate) enum Tracked {
    Instance {
        key: DependencyKey,
        instance: Instance,
        dispose: DisposeFn,
    },
    Scope(Weak<ContainerInner>),
}

/// Registration-ordered record of what a container must release.
#[derive(Default)]
pub(crate) struct DisposalRegistry {
    entries: Mutex<Vec<Tracked>>,
}

impl DisposalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_instance(&self, key: DependencyKey, instance: Instance, dispose: DisposeFn) {
        trace!(key = %key, "Tracking disposable instance");
        self.entries.lock().push(Tracked::Instance { key, instance, dispose });
    }

    /// Tracks a child scope, pruning scopes that are already gone.
    pub fn track_scope(&self, scope: Weak<ContainerInner>) {
        let mut entries = self.entries.lock();
        entries.retain(|entry| match entry {
            Tracked::Scope(weak) => weak.strong_count() > 0,
            Tracked::Instance { .. } => true,
        });
        entries.push(Tracked::Scope(scope));
    }

    /// Empties the record, returning entries oldest first.
    ///
    /// The lock is released before anything is disposed, so dispose hooks
    /// may touch the container freely.
    pub fn drain(&self) -> Vec<Tracked> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Runs every drained entry in order.
pub(crate) fn dispose_all(entries: Vec<Tracked>) {
    for entry in entries {
        match entry {
            Tracked::Instance { key, instance, dispose } => {
                trace!(key = %key, "Disposing instance");
                dispose(&instance);
            }
            Tracked::Scope(weak) => match weak.upgrade() {
                Some(scope) => {
                    scope.dispose_local();
                }
                None => trace!("Lifetime scope already released"),
            },
        }
    }
}
