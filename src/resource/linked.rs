//! The to-many relationship value: linked resources plus pending local
//! mutations.

use crate::resource::Resource;

/// An ordered sequence of currently-linked resources together with the
/// transient `added`/`removed` sets recording local mutations not yet
/// synced.
///
/// The pending sets are cleared only after a successful sync of this
/// specific relationship; a server refresh replaces the synced list while
/// re-applying pending local mutations to the visible sequence.
#[derive(Debug, Clone, Default)]
pub struct LinkedResourceCollection {
    resources: Vec<Resource>,
    added: Vec<Resource>,
    removed: Vec<Resource>,
}

/// Two handles refer to the same linked resource when they share state or
/// carry the same persisted identity.
fn matches(a: &Resource, b: &Resource) -> bool {
    a.ptr_eq(b) || a.same_identity(b)
}

fn position(list: &[Resource], target: &Resource) -> Option<usize> {
    list.iter().position(|r| matches(r, target))
}

impl LinkedResourceCollection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The currently-linked resources, in order.
    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Local additions not yet synced.
    #[must_use]
    pub fn added(&self) -> &[Resource] {
        &self.added
    }

    /// Local removals not yet synced.
    #[must_use]
    pub fn removed(&self) -> &[Resource] {
        &self.removed
    }

    pub(crate) fn link(&mut self, target: &Resource) {
        if position(&self.resources, target).is_some() {
            return;
        }
        self.resources.push(target.clone());
        if let Some(i) = position(&self.removed, target) {
            // Re-linking a pending removal cancels the removal
            self.removed.remove(i);
        } else {
            self.added.push(target.clone());
        }
    }

    pub(crate) fn unlink(&mut self, target: &Resource) {
        let Some(i) = position(&self.resources, target) else {
            return;
        };
        self.resources.remove(i);
        if let Some(j) = position(&self.added, target) {
            // A never-synced addition simply disappears
            self.added.remove(j);
        } else {
            self.removed.push(target.clone());
        }
    }

    /// Replaces the synced list from a server response, keeping pending
    /// sets intact and re-applying them to the visible sequence.
    pub(crate) fn set_synced(&mut self, synced: Vec<Resource>) {
        self.resources = synced;
        let removed = self.removed.clone();
        self.resources
            .retain(|r| position(&removed, r).is_none());
        for addition in &self.added {
            if position(&self.resources, addition).is_none() {
                self.resources.push(addition.clone());
            }
        }
    }

    pub(crate) fn clear_added(&mut self) {
        self.added.clear();
    }

    pub(crate) fn clear_removed(&mut self) {
        self.removed.clear();
    }

    pub(crate) fn clear_pending(&mut self) {
        self.added.clear();
        self.removed.clear();
    }
}
