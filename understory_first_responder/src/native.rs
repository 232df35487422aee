// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The native toolkit seam.
//!
//! The toolkit owns every view. This crate only ever stores the toolkit's
//! handles, which must be plain identifiers that do not keep a view alive
//! (for example generational ids). A handle to a removed view is expected to
//! answer `false` to [`NativeToolkit::can_become_focused`].

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

/// Focus-related view, window, and notification primitives of a native UI toolkit.
pub trait NativeToolkit {
    /// Non-owning handle of a native view.
    type View: Copy + Eq + Hash + Debug;
    /// Non-owning handle of a top-level container (a window).
    type Window: Copy + Eq + Hash + Debug;
    /// Handle of a focus-change subscription.
    ///
    /// Dropping the handle is expected to end the subscription, so a toolkit
    /// never queues changes for a subscriber that went away.
    type Observer: Debug;

    /// Whether `view` is live and can currently become the first responder.
    fn can_become_focused(&self, view: Self::View) -> bool;

    /// Structural parent of `view`, or `None` for top-level views and stale handles.
    fn parent_of(&self, view: Self::View) -> Option<Self::View>;

    /// Children of `view` in document order.
    fn children_of(&self, view: Self::View) -> &[Self::View];

    /// The window that currently owns `view`.
    fn window_of(&self, view: Self::View) -> Option<Self::Window>;

    /// Ask the toolkit to make `view` the first responder (and its window key).
    fn make_focused(&mut self, view: Self::View) -> bool;

    /// Ask the toolkit to resign focus held by `view` or its subtree.
    fn resign_focus(&mut self, view: Self::View) -> bool;

    /// Subscribe to first responder changes of `window`.
    fn observe_focus(&mut self, window: Self::Window) -> Self::Observer;

    /// End a subscription now, discarding its pending changes.
    fn unobserve_focus(&mut self, observer: Self::Observer);

    /// Move pending changes for `observer` into `out`, oldest first.
    ///
    /// `None` entries mean the window no longer has a first responder.
    fn poll_focus(&mut self, observer: &Self::Observer, out: &mut Vec<Option<Self::View>>);
}

/// Number of parent→child hops from `ancestor` down to `view`.
///
/// Returns `Some(0)` when they are the same view and `None` when `ancestor` is
/// not on `view`'s parent chain.
pub fn ancestor_distance<N: NativeToolkit + ?Sized>(
    toolkit: &N,
    view: N::View,
    ancestor: N::View,
) -> Option<usize> {
    let mut distance = 0;
    let mut current = view;
    loop {
        if current == ancestor {
            return Some(distance);
        }
        current = toolkit.parent_of(current)?;
        distance += 1;
    }
}

/// Returns true if `view` is `ancestor` or lies somewhere below it.
pub fn is_descendant<N: NativeToolkit + ?Sized>(
    toolkit: &N,
    view: N::View,
    ancestor: N::View,
) -> bool {
    ancestor_distance(toolkit, view, ancestor).is_some()
}
