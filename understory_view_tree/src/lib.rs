// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory View Tree: an in-memory native view hierarchy with window-scoped focus.
//!
//! This crate plays the part of a platform UI toolkit for focus purposes. It does not draw,
//! lay out, or hit test. It keeps just enough state to answer the questions a focus layer asks:
//!
//! - Which views exist, and how are they nested? Roots are windows.
//! - Can a given view become the first responder? See [`ViewFlags::FOCUSABLE`].
//! - Which view is the first responder of each window, and which window is key?
//! - What changed? Each window has a focus-change notification source that any number of
//!   observers can subscribe to with [`ViewTree::observe_focus`].
//!
//! ## API overview
//!
//! - [`ViewTree`]: container managing views, focus, and observers.
//! - [`ViewId`]: generational handle of a view. Handles never keep a view alive.
//! - [`ViewFlags`]: visibility and focus capability.
//! - [`FocusObserver`]: subscription handle for one window's focus changes. Dropping it ends
//!   the subscription.
//!
//! Key operations:
//! - [`ViewTree::insert`] / [`ViewTree::remove`] / [`ViewTree::reparent`] / [`ViewTree::set_flags`]
//! - [`ViewTree::focus`] and [`ViewTree::resign`] with boolean success.
//! - [`ViewTree::parent_of`], [`ViewTree::children_of`], [`ViewTree::window_of`], and
//!   [`ViewTree::is_descendant`] for structural queries.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod tree;
mod types;

pub use tree::ViewTree;
pub use types::{FocusObserver, ViewFlags, ViewId};
