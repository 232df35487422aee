// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tag resolver: map a natively focused view back to an application tag.
//!
//! The winning tag is the one registered for the view itself or for its
//! closest ancestor, where distance is the number of parent→child hops from
//! the registered view down to the focused view. This lets a tag placed on a
//! container (for example a search field wrapping a text editor) claim focus
//! that lands on one of its internal views.
//!
//! The walk goes upward from the focused view, so the first registered view
//! found is a minimal-distance candidate. The registry keeps at most one tag
//! per view, so two equidistant candidates cannot occur; callers should still
//! not rely on a particular winner if a toolkit reports a view under more than
//! one registered view.

use core::fmt::Debug;
use core::hash::Hash;

use crate::native::NativeToolkit;
use crate::registry::TagRegistry;

/// A resolved tag and its distance from the focused view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution<T> {
    /// Tag of the closest registered view.
    pub tag: T,
    /// Parent→child hops from the registered view to the focused view.
    pub distance: usize,
}

/// Resolve `view` to the tag of the closest registered ancestor-or-self.
///
/// Returns `None` when `view` is `None` (focus was cleared) or when no
/// registered view lies on its parent chain.
pub fn resolve<T, N>(
    registry: &TagRegistry<T, N::View>,
    view: Option<N::View>,
    toolkit: &N,
) -> Option<T>
where
    T: Clone + Eq + Hash + Debug,
    N: NativeToolkit + ?Sized,
{
    resolve_with_distance(registry, view, toolkit).map(|r| r.tag)
}

/// Like [`resolve`], also reporting the winning distance.
pub fn resolve_with_distance<T, N>(
    registry: &TagRegistry<T, N::View>,
    view: Option<N::View>,
    toolkit: &N,
) -> Option<Resolution<T>>
where
    T: Clone + Eq + Hash + Debug,
    N: NativeToolkit + ?Sized,
{
    let mut current = view?;
    let mut distance = 0;
    loop {
        if let Some(tag) = registry.tag_for(current) {
            return Some(Resolution {
                tag: tag.clone(),
                distance,
            });
        }
        current = toolkit.parent_of(current)?;
        distance += 1;
    }
}
