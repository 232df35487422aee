// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the view tree: view identifiers, flags, and observer handles.

use alloc::rc::Rc;

/// Identifier for a view in the tree (generational).
///
/// A `ViewId` never keeps its view alive. Once the view is removed the id goes
/// stale, and a later view reusing the same slot receives a newer generation,
/// so stale ids never alias live views.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ViewId(pub(crate) u32, pub(crate) u32);

impl ViewId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// View flags controlling visibility and focus capability.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ViewFlags: u8 {
        /// View is visible (hidden views cannot take focus).
        const VISIBLE   = 0b0000_0001;
        /// View can become the first responder of its window.
        const FOCUSABLE = 0b0000_0010;
    }
}

impl Default for ViewFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// Handle for a focus-change subscription on one window.
///
/// Returned by [`ViewTree::observe_focus`](crate::ViewTree::observe_focus) and
/// drained with [`ViewTree::poll_focus`](crate::ViewTree::poll_focus).
///
/// The subscription lives exactly as long as this handle. Once the handle is
/// dropped the tree stops queuing changes for it;
/// [`ViewTree::unobserve_focus`](crate::ViewTree::unobserve_focus) ends it
/// right away.
#[derive(Debug)]
pub struct FocusObserver {
    pub(crate) id: u32,
    /// Keeps the tree's side of the subscription alive.
    pub(crate) _token: Rc<()>,
}
