// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, flags, focus, and observers.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::types::{FocusObserver, ViewFlags, ViewId};

/// Native view hierarchy with window-scoped focus.
///
/// Every root view is a window. Each window has at most one first responder,
/// and the most recently focused window is the key window.
///
/// ## Example
///
/// ```rust
/// use understory_view_tree::{ViewFlags, ViewTree};
///
/// let mut tree = ViewTree::new();
/// let window = tree.insert(None, ViewFlags::VISIBLE);
/// let field = tree.insert(Some(window), ViewFlags::VISIBLE | ViewFlags::FOCUSABLE);
///
/// let observer = tree.observe_focus(window);
/// assert!(tree.focus(field));
/// assert_eq!(tree.first_responder(window), Some(field));
///
/// let mut changes = Vec::new();
/// tree.poll_focus(&observer, &mut changes);
/// assert_eq!(changes, vec![Some(field)]);
/// ```
pub struct ViewTree {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    /// window -> first responder
    first_responders: HashMap<ViewId, ViewId>,
    key_window: Option<ViewId>,
    observers: Vec<Observer>,
    next_observer: u32,
}

impl core::fmt::Debug for ViewTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("ViewTree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("key_window", &self.key_window)
            .field("observers", &self.focus_observer_count())
            .finish_non_exhaustive()
    }
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<ViewId>,
    children: SmallVec<[ViewId; 4]>,
    flags: ViewFlags,
}

#[derive(Clone, Debug)]
struct Observer {
    id: u32,
    window: ViewId,
    pending: Vec<Option<ViewId>>,
    /// Dead once the subscriber drops its handle.
    token: Weak<()>,
}

impl ViewTree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            first_responders: HashMap::new(),
            key_window: None,
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    /// Insert a new view as the last child of `parent`, or as a new window if `None`.
    ///
    /// A stale `parent` is ignored and the view becomes a window.
    pub fn insert(&mut self, parent: Option<ViewId>, flags: ViewFlags) -> ViewId {
        let node = |generation| Node {
            generation,
            parent: None,
            children: SmallVec::new(),
            flags,
        };
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(node(generation));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ViewId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(node(generation)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ViewId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = ViewId::new(idx, generation);
        if let Some(p) = parent
            && self.is_alive(p)
        {
            self.link_parent(id, p);
        }
        id
    }

    /// Remove a view (and its subtree) from the tree.
    ///
    /// If the subtree holds its window's focus, the window loses its first
    /// responder and observers are told focus went to nothing.
    pub fn remove(&mut self, id: ViewId) {
        if !self.is_alive(id) {
            return;
        }
        self.release_focus_within(id);
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        self.remove_subtree(id);
    }

    /// Reparent `id` under `new_parent` (or make it a window if `None`).
    ///
    /// Moving a subtree that holds focus into another window clears focus in
    /// the old window. Requests that would create a cycle are ignored.
    pub fn reparent(&mut self, id: ViewId, new_parent: Option<ViewId>) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(p) = new_parent
            && (!self.is_alive(p) || self.is_descendant(p, id))
        {
            return;
        }
        let old_window = self.window_of(id);
        let new_window = match new_parent {
            Some(p) => self.window_of(p),
            None => Some(id),
        };
        if old_window != new_window {
            self.release_focus_within(id);
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        if let Some(p) = new_parent {
            self.link_parent(id, p);
        }
    }

    /// Update view flags.
    pub fn set_flags(&mut self, id: ViewId, flags: ViewFlags) {
        if let Some(n) = self.node_opt_mut(id) {
            n.flags = flags;
        }
    }

    /// Returns the flags of a view if the identifier is live.
    pub fn flags(&self, id: ViewId) -> Option<ViewFlags> {
        self.node_opt(id).map(|n| n.flags)
    }

    /// Returns true if `id` refers to a live view.
    pub fn is_alive(&self, id: ViewId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .is_some_and(|n| n.generation == id.1)
    }

    /// Returns the parent of a view if live, or `None` for windows or stale ids.
    pub fn parent_of(&self, id: ViewId) -> Option<ViewId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Get the children of a view in document order, or an empty slice if the view is stale.
    pub fn children_of(&self, id: ViewId) -> &[ViewId] {
        match self.node_opt(id) {
            Some(n) => &n.children,
            None => &[],
        }
    }

    /// Returns the window (root view) that owns `id`, or `None` for stale ids.
    pub fn window_of(&self, id: ViewId) -> Option<ViewId> {
        if !self.is_alive(id) {
            return None;
        }
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            current = parent;
        }
        Some(current)
    }

    /// Returns true if `id` is `ancestor` or lies somewhere below it.
    pub fn is_descendant(&self, id: ViewId, ancestor: ViewId) -> bool {
        if !self.is_alive(id) || !self.is_alive(ancestor) {
            return false;
        }
        let mut current = Some(id);
        while let Some(view) = current {
            if view == ancestor {
                return true;
            }
            current = self.parent_of(view);
        }
        false
    }

    /// Returns true if `id` is live, visible, and focusable.
    pub fn can_focus(&self, id: ViewId) -> bool {
        self.flags(id)
            .is_some_and(|f| f.contains(ViewFlags::VISIBLE | ViewFlags::FOCUSABLE))
    }

    /// Make `id` the first responder of its window and make that window key.
    ///
    /// Returns `false` (and changes nothing) when the view cannot take focus.
    /// Observers of the window are notified only when the first responder changes.
    pub fn focus(&mut self, id: ViewId) -> bool {
        if !self.can_focus(id) {
            return false;
        }
        let Some(window) = self.window_of(id) else {
            return false;
        };
        self.key_window = Some(window);
        if self.first_responders.get(&window) != Some(&id) {
            self.first_responders.insert(window, id);
            self.notify(window, Some(id));
        }
        true
    }

    /// Resign focus held by `id` or by any view below it.
    ///
    /// Returns `false` when nothing in that subtree is the first responder.
    pub fn resign(&mut self, id: ViewId) -> bool {
        let Some(window) = self.window_of(id) else {
            return false;
        };
        match self.first_responders.get(&window).copied() {
            Some(current) if self.is_descendant(current, id) => {
                self.first_responders.remove(&window);
                self.notify(window, None);
                true
            }
            _ => false,
        }
    }

    /// Returns the first responder of `window`, if any.
    pub fn first_responder(&self, window: ViewId) -> Option<ViewId> {
        self.first_responders
            .get(&window)
            .copied()
            .filter(|id| self.is_alive(*id))
    }

    /// Returns the window that most recently took focus, if it is still live.
    pub fn key_window(&self) -> Option<ViewId> {
        self.key_window.filter(|w| self.is_alive(*w))
    }

    /// Subscribe to first responder changes of `window`.
    ///
    /// Every subscription receives its own copy of each change; changes that
    /// happened before subscribing are not replayed. The subscription ends when
    /// the returned handle is dropped.
    pub fn observe_focus(&mut self, window: ViewId) -> FocusObserver {
        let id = self.next_observer;
        self.next_observer = self.next_observer.wrapping_add(1);
        let token = Rc::new(());
        self.observers.push(Observer {
            id,
            window,
            pending: Vec::new(),
            token: Rc::downgrade(&token),
        });
        FocusObserver { id, _token: token }
    }

    /// End a subscription now and discard its pending changes.
    pub fn unobserve_focus(&mut self, observer: FocusObserver) {
        self.observers.retain(|o| o.id != observer.id);
    }

    /// Move pending changes for `observer` into `out`, oldest first.
    pub fn poll_focus(&mut self, observer: &FocusObserver, out: &mut Vec<Option<ViewId>>) {
        if let Some(o) = self.observers.iter_mut().find(|o| o.id == observer.id) {
            out.append(&mut o.pending);
        }
    }

    /// Number of subscriptions whose handle is still held.
    pub fn focus_observer_count(&self) -> usize {
        self.observers
            .iter()
            .filter(|o| o.token.strong_count() > 0)
            .count()
    }
}

impl ViewTree {
    // --- internals ---

    fn node(&self, id: ViewId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling ViewId")
    }

    fn node_opt(&self, id: ViewId) -> Option<&Node> {
        self.nodes
            .get(id.idx())
            .and_then(|slot| slot.as_ref())
            .filter(|n| n.generation == id.1)
    }

    fn node_opt_mut(&mut self, id: ViewId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.idx())
            .and_then(|slot| slot.as_mut())
            .filter(|n| n.generation == id.1)
    }

    fn link_parent(&mut self, id: ViewId, parent: ViewId) {
        if let Some(p) = self.node_opt_mut(parent) {
            p.children.push(id);
        }
        if let Some(n) = self.node_opt_mut(id) {
            n.parent = Some(parent);
        }
    }

    fn unlink_parent(&mut self, id: ViewId, parent: ViewId) {
        if let Some(p) = self.node_opt_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.node_opt_mut(id) {
            n.parent = None;
        }
    }

    fn remove_subtree(&mut self, id: ViewId) {
        let children = self.node(id).children.clone();
        for child in children {
            self.remove_subtree(child);
        }
        self.first_responders.remove(&id);
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    fn release_focus_within(&mut self, id: ViewId) {
        let Some(window) = self.window_of(id) else {
            return;
        };
        if let Some(current) = self.first_responders.get(&window).copied()
            && self.is_descendant(current, id)
        {
            self.first_responders.remove(&window);
            self.notify(window, None);
        }
    }

    fn notify(&mut self, window: ViewId, change: Option<ViewId>) {
        self.observers.retain(|o| o.token.strong_count() > 0);
        for o in self.observers.iter_mut().filter(|o| o.window == window) {
            o.pending.push(change);
        }
    }
}
