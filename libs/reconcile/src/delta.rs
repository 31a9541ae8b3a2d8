//! Desired vs dataplane set tracking.
//!
//! [`SetDeltaTracker`] holds two sets of keys: the keys that should exist
//! and the keys the caller believes currently exist. Pending additions and
//! deletions are derived from those two sets every time they are asked for.
//! Callers drain pending work with [`PendingAdditions::iter`] and
//! [`PendingDeletions::iter`], reporting per key whether the dataplane was
//! actually updated.

use std::collections::HashSet;
use std::hash::Hash;

/// Result of visiting one pending key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterAction {
    /// Leave the dataplane set alone; the key stays pending.
    NoOp,

    /// The dataplane now matches the desired state for this key.
    UpdateDataplane,
}

/// Tracks desired and dataplane membership of a set of keys.
#[derive(Debug, Clone)]
pub struct SetDeltaTracker<K> {
    desired: HashSet<K>,
    dataplane: HashSet<K>,
}

impl<K> Default for SetDeltaTracker<K> {
    fn default() -> Self {
        Self {
            desired: HashSet::new(),
            dataplane: HashSet::new(),
        }
    }
}

impl<K> SetDeltaTracker<K>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable view of the desired set.
    pub fn desired(&mut self) -> SetView<'_, K> {
        SetView {
            set: &mut self.desired,
        }
    }

    /// Mutable view of the dataplane set.
    pub fn dataplane(&mut self) -> SetView<'_, K> {
        SetView {
            set: &mut self.dataplane,
        }
    }

    /// Keys that are desired but not in the dataplane.
    pub fn pending_additions(&mut self) -> PendingAdditions<'_, K> {
        PendingAdditions {
            desired: &self.desired,
            dataplane: &mut self.dataplane,
        }
    }

    /// Keys that are in the dataplane but no longer desired.
    pub fn pending_deletions(&mut self) -> PendingDeletions<'_, K> {
        PendingDeletions {
            desired: &self.desired,
            dataplane: &mut self.dataplane,
        }
    }

    /// Returns true if the key is desired.
    pub fn is_desired(&self, key: &K) -> bool {
        self.desired.contains(key)
    }

    /// Returns true if the key is believed to be in the dataplane.
    pub fn in_dataplane(&self, key: &K) -> bool {
        self.dataplane.contains(key)
    }

    /// Number of desired keys.
    pub fn desired_len(&self) -> usize {
        self.desired.len()
    }

    /// Number of keys believed to be in the dataplane.
    pub fn dataplane_len(&self) -> usize {
        self.dataplane.len()
    }

    /// Number of keys that still need an addition or a deletion.
    pub fn pending_len(&self) -> usize {
        self.desired.symmetric_difference(&self.dataplane).count()
    }

    /// Returns true if the dataplane matches the desired state.
    pub fn in_sync(&self) -> bool {
        self.desired == self.dataplane
    }
}

// =============================================================================
// Set View
// =============================================================================

/// Mutable handle on one of the tracker's sets.
pub struct SetView<'a, K> {
    set: &'a mut HashSet<K>,
}

impl<K> SetView<'_, K>
where
    K: Eq + Hash,
{
    /// Add a key. Adding a present key is a no-op.
    pub fn add(&mut self, key: K) {
        self.set.insert(key);
    }

    /// Remove a key. Removing an absent key is a no-op.
    pub fn delete(&mut self, key: &K) {
        self.set.remove(key);
    }

    /// Remove every key.
    pub fn delete_all(&mut self) {
        self.set.clear();
    }

    /// Replace the whole set with the given keys.
    pub fn replace_all<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
    {
        self.set.clear();
        self.set.extend(keys);
    }

    /// Returns true if the key is present.
    pub fn contains(&self, key: &K) -> bool {
        self.set.contains(key)
    }

    /// Number of keys in the set.
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

// =============================================================================
// Pending Work
// =============================================================================

/// Keys in `desired − dataplane`, computed when iterated.
pub struct PendingAdditions<'a, K> {
    desired: &'a HashSet<K>,
    dataplane: &'a mut HashSet<K>,
}

impl<K> PendingAdditions<'_, K>
where
    K: Eq + Hash + Clone,
{
    /// Number of pending additions right now.
    pub fn len(&self) -> usize {
        self.desired.difference(&*self.dataplane).count()
    }

    /// Returns true if nothing needs adding.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit every pending addition.
    ///
    /// Returning [`IterAction::UpdateDataplane`] adds the key to the
    /// dataplane set. Visit order is unspecified.
    pub fn iter<F>(self, mut visit: F)
    where
        F: FnMut(&K) -> IterAction,
    {
        let pending: Vec<K> = self.desired.difference(&*self.dataplane).cloned().collect();
        for key in pending {
            if visit(&key) == IterAction::UpdateDataplane {
                self.dataplane.insert(key);
            }
        }
    }
}

/// Keys in `dataplane − desired`, computed when iterated.
pub struct PendingDeletions<'a, K> {
    desired: &'a HashSet<K>,
    dataplane: &'a mut HashSet<K>,
}

impl<K> PendingDeletions<'_, K>
where
    K: Eq + Hash + Clone,
{
    /// Number of pending deletions right now.
    pub fn len(&self) -> usize {
        self.dataplane.difference(self.desired).count()
    }

    /// Returns true if nothing needs deleting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit every pending deletion.
    ///
    /// Returning [`IterAction::UpdateDataplane`] removes the key from the
    /// dataplane set. Visit order is unspecified.
    pub fn iter<F>(self, mut visit: F)
    where
        F: FnMut(&K) -> IterAction,
    {
        let pending: Vec<K> = self.dataplane.difference(self.desired).cloned().collect();
        for key in pending {
            if visit(&key) == IterAction::UpdateDataplane {
                self.dataplane.remove(&key);
            }
        }
    }
}
