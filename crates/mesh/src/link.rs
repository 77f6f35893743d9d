//! Link Manager - the node's view of who it is connected to
//!
//! Tracks the single optional parent link and the bounded set of child
//! links. Entries appear on radio connect events and disappear on disconnect
//! events; nothing else creates or destroys them.

use piconet_core::{ConnectionHandle, CHILD_CAPACITY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{MeshError, MeshResult};

/// Which side of the tree a link points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkRole {
    /// Link to the node above us (we were connected to)
    Parent,
    /// Link to a node below us (we connected out)
    Child,
}

/// One tracked connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Radio handle of the link
    pub handle: ConnectionHandle,
    /// Direction of the link
    pub role: LinkRole,
    /// Cleared when a write or notify on this link fails
    pub alive: bool,
}

impl LinkRecord {
    fn new(handle: ConnectionHandle, role: LinkRole) -> Self {
        Self {
            handle,
            role,
            alive: true,
        }
    }
}

/// Parent link plus bounded child links
#[derive(Debug)]
pub struct LinkManager {
    parent: Option<LinkRecord>,
    children: BTreeMap<ConnectionHandle, LinkRecord>,
    capacity: usize,
}

impl Default for LinkManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkManager {
    /// Link manager with the standard child capacity
    pub fn new() -> Self {
        Self::with_capacity(CHILD_CAPACITY)
    }

    /// Link manager holding at most `capacity` children
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parent: None,
            children: BTreeMap::new(),
            capacity,
        }
    }

    /// Record the inbound link from our parent.
    ///
    /// A second parent is rejected; the existing one is kept.
    pub fn attach_parent(&mut self, handle: ConnectionHandle) -> MeshResult<()> {
        if let Some(existing) = &self.parent {
            return Err(MeshError::AlreadyHasParent {
                existing: existing.handle,
            });
        }
        if self.children.contains_key(&handle) {
            return Err(MeshError::DuplicateHandle(handle));
        }
        self.parent = Some(LinkRecord::new(handle, LinkRole::Parent));
        Ok(())
    }

    /// Forget the parent link if `handle` is it. Returns whether it matched.
    pub fn detach_parent(&mut self, handle: ConnectionHandle) -> bool {
        match &self.parent {
            Some(parent) if parent.handle == handle => {
                self.parent = None;
                true
            }
            _ => false,
        }
    }

    /// Record a new outbound link to a child.
    pub fn add_child(&mut self, handle: ConnectionHandle) -> MeshResult<()> {
        if self.is_parent(handle) || self.children.contains_key(&handle) {
            return Err(MeshError::DuplicateHandle(handle));
        }
        if self.children.len() >= self.capacity {
            return Err(MeshError::AtCapacity {
                capacity: self.capacity,
            });
        }
        self.children
            .insert(handle, LinkRecord::new(handle, LinkRole::Child));
        Ok(())
    }

    /// Forget a child link. Returns whether it was tracked.
    pub fn remove_child(&mut self, handle: ConnectionHandle) -> bool {
        self.children.remove(&handle).is_some()
    }

    /// Whether a parent link exists
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// Handle of the parent link
    pub fn parent(&self) -> Option<ConnectionHandle> {
        self.parent.as_ref().map(|p| p.handle)
    }

    /// Whether `handle` is the parent link
    pub fn is_parent(&self, handle: ConnectionHandle) -> bool {
        self.parent() == Some(handle)
    }

    /// Whether `handle` is a tracked child link
    pub fn is_child(&self, handle: ConnectionHandle) -> bool {
        self.children.contains_key(&handle)
    }

    /// Number of child links
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Maximum number of child links
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether no more children fit
    pub fn is_full(&self) -> bool {
        self.children.len() >= self.capacity
    }

    /// Current child handles
    pub fn children(&self) -> impl Iterator<Item = ConnectionHandle> + '_ {
        self.children.keys().copied()
    }

    /// Owned copy of the child handles, safe to hold across later mutation
    pub fn children_snapshot(&self) -> Vec<ConnectionHandle> {
        self.children().collect()
    }

    /// Record for a tracked handle in either role
    pub fn record(&self, handle: ConnectionHandle) -> Option<&LinkRecord> {
        match &self.parent {
            Some(parent) if parent.handle == handle => Some(parent),
            _ => self.children.get(&handle),
        }
    }

    /// Update the liveness flag of a tracked link. Returns whether it was tracked.
    pub fn mark_alive(&mut self, handle: ConnectionHandle, alive: bool) -> bool {
        if let Some(parent) = self.parent.as_mut().filter(|p| p.handle == handle) {
            parent.alive = alive;
            return true;
        }
        match self.children.get_mut(&handle) {
            Some(child) => {
                child.alive = alive;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn h(n: u16) -> ConnectionHandle {
        ConnectionHandle(n)
    }

    #[test]
    fn test_attach_and_detach_parent() {
        let mut links = LinkManager::new();
        assert!(!links.has_parent());

        links.attach_parent(h(1)).unwrap();
        assert!(links.has_parent());
        assert_eq!(links.parent(), Some(h(1)));

        // Stale disconnect for another handle is a no-op
        assert!(!links.detach_parent(h(2)));
        assert!(links.has_parent());

        assert!(links.detach_parent(h(1)));
        assert!(!links.has_parent());
        // Duplicate disconnect
        assert!(!links.detach_parent(h(1)));
    }

    #[test]
    fn test_second_parent_rejected_first_kept() {
        let mut links = LinkManager::new();
        links.attach_parent(h(1)).unwrap();

        match links.attach_parent(h(2)) {
            Err(MeshError::AlreadyHasParent { existing }) => assert_eq!(existing, h(1)),
            other => panic!("Expected AlreadyHasParent, got {other:?}"),
        }
        assert_eq!(links.parent(), Some(h(1)));
    }

    #[test]
    fn test_handle_in_one_role_only() {
        let mut links = LinkManager::new();
        links.attach_parent(h(1)).unwrap();
        assert!(matches!(
            links.add_child(h(1)),
            Err(MeshError::DuplicateHandle(_))
        ));

        let mut links = LinkManager::new();
        links.add_child(h(5)).unwrap();
        assert!(matches!(
            links.attach_parent(h(5)),
            Err(MeshError::DuplicateHandle(_))
        ));
        assert!(matches!(
            links.add_child(h(5)),
            Err(MeshError::DuplicateHandle(_))
        ));
        assert_eq!(links.child_count(), 1);
    }

    #[test]
    fn test_capacity_plus_one_rejected() {
        let mut links = LinkManager::new();
        for n in 0..CHILD_CAPACITY as u16 {
            links.add_child(h(10 + n)).unwrap();
        }
        assert!(links.is_full());

        let before = links.children_snapshot();
        match links.add_child(h(99)) {
            Err(MeshError::AtCapacity { capacity }) => assert_eq!(capacity, CHILD_CAPACITY),
            other => panic!("Expected AtCapacity, got {other:?}"),
        }
        assert_eq!(links.children_snapshot(), before);
    }

    #[test]
    fn test_remove_child_leaves_others() {
        let mut links = LinkManager::new();
        links.add_child(h(1)).unwrap();
        links.add_child(h(2)).unwrap();
        links.add_child(h(3)).unwrap();

        assert!(links.remove_child(h(2)));
        assert_eq!(links.children_snapshot(), vec![h(1), h(3)]);

        // Untracked handle
        assert!(!links.remove_child(h(42)));
        assert_eq!(links.children_snapshot(), vec![h(1), h(3)]);
    }

    #[test]
    fn test_liveness_flag() {
        let mut links = LinkManager::new();
        links.add_child(h(4)).unwrap();
        assert!(links.record(h(4)).unwrap().alive);

        assert!(links.mark_alive(h(4), false));
        assert!(!links.record(h(4)).unwrap().alive);
        assert_eq!(links.record(h(4)).unwrap().role, LinkRole::Child);

        assert!(!links.mark_alive(h(8), false));
    }

    proptest! {
        #[test]
        fn prop_child_count_never_exceeds_capacity(
            capacity in 1usize..=CHILD_CAPACITY,
            ops in proptest::collection::vec((any::<bool>(), 0u16..16), 0..64),
        ) {
            let mut links = LinkManager::with_capacity(capacity);
            for (connect, raw) in ops {
                if connect {
                    let before = links.child_count();
                    if links.add_child(h(raw)).is_err() {
                        prop_assert_eq!(links.child_count(), before);
                    }
                } else {
                    links.remove_child(h(raw));
                }
                prop_assert!(links.child_count() <= capacity);
            }
        }
    }
}
