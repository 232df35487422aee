// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View-discovery probe: attach a tag to the focusable view rendered just before it.
//!
//! ## Convention
//!
//! A tag is declared immediately after the focusable element it targets. The
//! probe's own native host view therefore follows that element among its
//! siblings, and the probe searches the *preceding* siblings of its host,
//! nearest first. A sibling that can take focus wins outright. Otherwise the
//! sibling's subtree is searched depth-first in document order, and if it holds
//! nothing focusable the search moves on to the previous sibling.
//!
//! ## Reporting
//!
//! Until the probe has run, it reports its tag under
//! [`ExpectedResponderKey`](crate::preferences::ExpectedResponderKey) so the
//! chain can tell "resolving soon" apart from "never tagged". Once it has run
//! it stops reporting that, and if a view was found it reports it under
//! [`FoundResponderKey`](crate::preferences::FoundResponderKey).
//!
//! ```
//! use understory_first_responder::probe::responder_tag;
//!
//! let probe = responder_tag::<_, u32>("email");
//! let prefs = probe.preferences();
//! assert!(prefs.found.is_empty());
//! assert_eq!(prefs.expected.len(), 1);
//! ```

use alloc::vec;
use alloc::vec::Vec;

use crate::native::NativeToolkit;
use crate::preferences::{ExpectedResponder, FoundResponder, ResponderPreferences};

/// Attach `tag` to the nearest focusable view rendered before this point.
pub fn responder_tag<T, V>(tag: T) -> ResponderProbe<T, V> {
    ResponderProbe::new(tag)
}

/// Per-tagged-view probe state.
#[derive(Clone, Debug)]
pub struct ResponderProbe<T, V> {
    tag: T,
    responder: Option<V>,
    /// Whether the search is still guaranteed to run.
    will_find: bool,
}

impl<T, V> ResponderProbe<T, V> {
    /// Create a probe that has not materialized yet.
    pub fn new(tag: T) -> Self {
        Self {
            tag,
            responder: None,
            will_find: true,
        }
    }

    /// The tag this probe reports.
    pub fn tag(&self) -> &T {
        &self.tag
    }

    /// Whether the probe still has to run its search.
    pub fn is_pending(&self) -> bool {
        self.will_find
    }

    /// Start a new lifecycle: forget the found view and report the tag as expected again.
    pub fn dismantle(&mut self) {
        self.responder = None;
        self.will_find = true;
    }
}

impl<T: Clone, V: Copy + PartialEq> ResponderProbe<T, V> {
    /// The native view found by the last search.
    pub fn responder(&self) -> Option<V> {
        self.responder
    }

    /// Run the sibling search from the probe's native `host`.
    ///
    /// Call this when the probe's node has been materialized into the native
    /// tree. `host` is `None` if the declarative layer could not locate it.
    /// Returns `true` when the probe's preferences changed, that is on the
    /// first run of a lifecycle or when the found view's identity changed.
    /// A search that finds nothing keeps the previously found view.
    pub fn introspect<N>(&mut self, host: Option<V>, toolkit: &N) -> bool
    where
        N: NativeToolkit<View = V> + ?Sized,
    {
        let was_pending = core::mem::replace(&mut self.will_find, false);
        let found = host.and_then(|h| find_preceding_responder(h, toolkit));
        let changed = match found {
            Some(view) if self.responder != Some(view) => {
                self.responder = Some(view);
                true
            }
            _ => false,
        };
        was_pending || changed
    }

    /// Preferences this probe contributes to its reader.
    pub fn preferences(&self) -> ResponderPreferences<T, V> {
        ResponderPreferences {
            found: self
                .responder
                .map(|view| {
                    vec![FoundResponder {
                        tag: self.tag.clone(),
                        view,
                    }]
                })
                .unwrap_or_default(),
            expected: if self.will_find {
                vec![ExpectedResponder {
                    tag: self.tag.clone(),
                }]
            } else {
                Vec::new()
            },
        }
    }
}

/// Find the nearest focusable view among the preceding siblings of `host`.
pub fn find_preceding_responder<N>(host: N::View, toolkit: &N) -> Option<N::View>
where
    N: NativeToolkit + ?Sized,
{
    let parent = toolkit.parent_of(host)?;
    let siblings = toolkit.children_of(parent);
    let entry = siblings.iter().position(|s| *s == host)?;
    siblings[..entry].iter().rev().find_map(|&sibling| {
        if toolkit.can_become_focused(sibling) {
            Some(sibling)
        } else {
            first_focusable_in(sibling, toolkit)
        }
    })
}

fn first_focusable_in<N>(root: N::View, toolkit: &N) -> Option<N::View>
where
    N: NativeToolkit + ?Sized,
{
    toolkit.children_of(root).iter().find_map(|&child| {
        if toolkit.can_become_focused(child) {
            Some(child)
        } else {
            first_focusable_in(child, toolkit)
        }
    })
}
