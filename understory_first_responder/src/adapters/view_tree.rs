// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native toolkit adapter for Understory View Tree.
//!
//! ## Feature
//!
//! Enable with `view_tree_adapter`.
//!
//! ## Notes
//!
//! Windows are the tree's root views, so `Window` and `View` are both
//! [`ViewId`]. A view can become focused when it is live, visible and
//! focusable. Focusing a view also makes its window key.

use alloc::vec::Vec;

use understory_view_tree::{FocusObserver, ViewId, ViewTree};

use crate::native::NativeToolkit;

impl NativeToolkit for ViewTree {
    type View = ViewId;
    type Window = ViewId;
    type Observer = FocusObserver;

    fn can_become_focused(&self, view: ViewId) -> bool {
        self.can_focus(view)
    }

    fn parent_of(&self, view: ViewId) -> Option<ViewId> {
        Self::parent_of(self, view)
    }

    fn children_of(&self, view: ViewId) -> &[ViewId] {
        Self::children_of(self, view)
    }

    fn window_of(&self, view: ViewId) -> Option<ViewId> {
        Self::window_of(self, view)
    }

    fn make_focused(&mut self, view: ViewId) -> bool {
        self.focus(view)
    }

    fn resign_focus(&mut self, view: ViewId) -> bool {
        self.resign(view)
    }

    fn observe_focus(&mut self, window: ViewId) -> FocusObserver {
        Self::observe_focus(self, window)
    }

    fn unobserve_focus(&mut self, observer: FocusObserver) {
        Self::unobserve_focus(self, observer);
    }

    fn poll_focus(&mut self, observer: &FocusObserver, out: &mut Vec<Option<ViewId>>) {
        Self::poll_focus(self, observer, out);
    }
}
