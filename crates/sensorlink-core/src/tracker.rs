//! Per-device subscription reference counting.
//!
//! Many logical subscribers may want the same component. The tracker counts
//! them and reports the transitions at which the single transport-level
//! subscription has to be created (0→1) or withdrawn (1→0).
//!
//! The tracker itself performs no I/O and takes no locks; the owning driver
//! serializes access to it.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Outcome of a reference count change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Count went 0→1: the transport subscription must be created.
    Activated,
    /// Count went up but was already active; holds the new count.
    Joined(u32),
    /// Count went 1→0: the transport subscription must be withdrawn.
    Deactivated,
    /// Count went down but stays active; holds the new count.
    Left(u32),
}

impl Transition {
    /// Whether the transition requires a transport call.
    pub fn is_edge(&self) -> bool {
        matches!(self, Self::Activated | Self::Deactivated)
    }
}

/// Reference counts of subscribed components for one device.
///
/// Counts survive disconnects; a reconnect replays them rather than
/// resetting them.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionTracker {
    counts: HashMap<String, u32>,
}

impl SubscriptionTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count for a component.
    pub fn count(&self, component: &str) -> u32 {
        self.counts.get(component).copied().unwrap_or(0)
    }

    /// Whether the component has at least one subscriber.
    pub fn is_active(&self, component: &str) -> bool {
        self.count(component) > 0
    }

    /// Whether any component has a subscriber.
    pub fn has_active(&self) -> bool {
        !self.counts.is_empty()
    }

    /// Whether any component other than `component` has a subscriber.
    ///
    /// The shared notification listener may only be torn down when this is
    /// false for the component being released.
    pub fn has_other_active_subscription(&self, component: &str) -> bool {
        self.counts.keys().any(|c| c != component)
    }

    /// Components with a non-zero count, sorted by name.
    pub fn active_components(&self) -> Vec<String> {
        let mut active: Vec<String> = self.counts.keys().cloned().collect();
        active.sort();
        active
    }

    /// Add a subscriber.
    pub fn acquire(&mut self, component: &str) -> Transition {
        let count = self.counts.entry(component.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            Transition::Activated
        } else {
            Transition::Joined(*count)
        }
    }

    /// Remove a subscriber.
    ///
    /// Releasing a component whose count is already zero is rejected with
    /// [`Error::RefcountViolation`] and leaves the tracker untouched.
    pub fn release(&mut self, component: &str) -> Result<Transition> {
        let Some(count) = self.counts.get_mut(component) else {
            return Err(Error::refcount_violation(component));
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(component);
            Ok(Transition::Deactivated)
        } else {
            Ok(Transition::Left(*count))
        }
    }

    /// Undo the most recent [`acquire`](Self::acquire) of a component.
    ///
    /// Used when the transport call that an activation triggered fails.
    pub fn rollback(&mut self, component: &str) {
        if let Some(count) = self.counts.get_mut(component) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(component);
            }
        }
    }
}
