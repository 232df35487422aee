// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native focus bridge: turns toolkit focus notifications into one stream of changes.
//!
//! ## Overview
//!
//! A [`FocusBridge`] subscribes to the focus-change source of each window it is
//! attached to and republishes what it hears as [`FocusChange`] values. It
//! never decides which tag a view belongs to; that is the resolver's job.
//!
//! Attaching is idempotent per window identity, so a window that owns many
//! registered views is still observed exactly once and no change is delivered
//! twice. Subscriptions end when the bridge is dropped or
//! [`detach`](FocusBridge::detach)ed.
//!
//! Polling keeps each window's changes in order and visits windows in attach
//! order. Changes from different windows are not ordered against each other,
//! so consumers poll right after each command they issue and leave the queue
//! to changes made outside the application.
//!
//! ## Toolkits without per-window notifications
//!
//! Some toolkits only expose the element-level "became first responder" and
//! "resigned first responder" entry points. [`InterceptionHub`] rebuilds the
//! per-window stream from those: the toolkit routes every element transition
//! through the hub (for example from a shared base type or a lifecycle hook
//! every focusable element registers), and its
//! [`NativeToolkit`](crate::native::NativeToolkit) implementation forwards
//! `observe_focus` / `poll_focus` to the hub.
//!
//! ```
//! use understory_first_responder::bridge::InterceptionHub;
//!
//! let mut hub: InterceptionHub<u32, &str> = InterceptionHub::new();
//! let observer = hub.observe("main");
//!
//! hub.became_focused(7, Some("main"));
//! hub.resigned_focus(7, Some("main"));
//! hub.became_focused(9, Some("inspector"));
//!
//! let mut changes = Vec::new();
//! hub.poll(&observer, &mut changes);
//! assert_eq!(changes, vec![Some(7), None]);
//! ```

use alloc::collections::VecDeque;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::native::NativeToolkit;

/// One native focus change: `window`'s first responder is now `view`, or nothing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FocusChange<V, W> {
    /// Window whose first responder changed.
    pub window: W,
    /// New first responder, or `None` when focus was cleared.
    pub view: Option<V>,
}

/// Window-scoped focus-change subscriptions, republished as a single queue.
pub struct FocusBridge<N: NativeToolkit> {
    observers: HashMap<N::Window, N::Observer>,
    /// Attach order; polling visits windows in this order.
    windows: Vec<N::Window>,
    queue: VecDeque<FocusChange<N::View, N::Window>>,
    scratch: Vec<Option<N::View>>,
}

impl<N: NativeToolkit> core::fmt::Debug for FocusBridge<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FocusBridge")
            .field("windows", &self.windows)
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl<N: NativeToolkit> Default for FocusBridge<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NativeToolkit> FocusBridge<N> {
    /// Create a bridge with no attached windows.
    pub fn new() -> Self {
        Self {
            observers: HashMap::new(),
            windows: Vec::new(),
            queue: VecDeque::new(),
            scratch: Vec::new(),
        }
    }

    /// Subscribe to `window`'s focus changes unless already subscribed.
    ///
    /// Returns `true` only when a new subscription was made.
    pub fn attach(&mut self, window: N::Window, toolkit: &mut N) -> bool {
        if self.observers.contains_key(&window) {
            return false;
        }
        let observer = toolkit.observe_focus(window);
        tracing::debug!(?window, ?observer, "attached focus bridge");
        self.observers.insert(window, observer);
        self.windows.push(window);
        true
    }

    /// End the subscription to `window`, dropping its queued changes.
    ///
    /// Returns `false` if `window` was not attached.
    pub fn detach(&mut self, window: N::Window, toolkit: &mut N) -> bool {
        let Some(observer) = self.observers.remove(&window) else {
            return false;
        };
        tracing::debug!(?window, ?observer, "detached focus bridge");
        toolkit.unobserve_focus(observer);
        self.windows.retain(|w| *w != window);
        self.queue.retain(|c| c.window != window);
        true
    }

    /// End every subscription and clear the queue.
    pub fn detach_all(&mut self, toolkit: &mut N) {
        for window in core::mem::take(&mut self.windows) {
            if let Some(observer) = self.observers.remove(&window) {
                toolkit.unobserve_focus(observer);
            }
        }
        self.queue.clear();
    }

    /// Whether `window` has been attached.
    pub fn is_attached(&self, window: N::Window) -> bool {
        self.observers.contains_key(&window)
    }

    /// Attached windows in attach order.
    pub fn windows(&self) -> &[N::Window] {
        &self.windows
    }

    /// Collect pending changes from every attached window into the queue.
    ///
    /// Returns how many changes were queued by this call. Changes of one window
    /// keep their order; windows are visited in attach order.
    pub fn poll(&mut self, toolkit: &mut N) -> usize {
        let before = self.queue.len();
        for window in &self.windows {
            let Some(observer) = self.observers.get(window) else {
                continue;
            };
            toolkit.poll_focus(observer, &mut self.scratch);
            self.queue
                .extend(self.scratch.drain(..).map(|view| FocusChange {
                    window: *window,
                    view,
                }));
        }
        self.queue.len() - before
    }

    /// Pop the oldest queued change.
    pub fn next_change(&mut self) -> Option<FocusChange<N::View, N::Window>> {
        self.queue.pop_front()
    }

    /// Drain every queued change, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = FocusChange<N::View, N::Window>> + '_ {
        self.queue.drain(..)
    }

    /// Number of queued changes.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no changes are queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Handle of an [`InterceptionHub`] subscription; dropping it ends the subscription.
#[derive(Debug)]
pub struct HubObserver {
    id: u32,
    _token: Rc<()>,
}

/// Per-window focus stream rebuilt from element-level focus transitions.
#[derive(Clone, Debug)]
pub struct InterceptionHub<V, W> {
    subscribers: Vec<Subscriber<V, W>>,
    next_id: u32,
}

#[derive(Clone, Debug)]
struct Subscriber<V, W> {
    id: u32,
    window: W,
    pending: Vec<Option<V>>,
    token: Weak<()>,
}

impl<V, W> Default for InterceptionHub<V, W> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 0,
        }
    }
}

impl<V: Copy + core::fmt::Debug, W: Copy + Eq + core::fmt::Debug> InterceptionHub<V, W> {
    /// Create a hub with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to transitions of elements owned by `window`.
    pub fn observe(&mut self, window: W) -> HubObserver {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let token = Rc::new(());
        self.subscribers.push(Subscriber {
            id,
            window,
            pending: Vec::new(),
            token: Rc::downgrade(&token),
        });
        HubObserver { id, _token: token }
    }

    /// End a subscription now and discard its pending changes.
    pub fn unobserve(&mut self, observer: HubObserver) {
        self.subscribers.retain(|s| s.id != observer.id);
    }

    /// Number of subscriptions whose handle is still held.
    pub fn observer_count(&self) -> usize {
        self.subscribers
            .iter()
            .filter(|s| s.token.strong_count() > 0)
            .count()
    }

    /// Element entry point: `view` became the first responder of `window`.
    ///
    /// Elements outside any window (`None`) are not republished.
    pub fn became_focused(&mut self, view: V, window: Option<W>) {
        tracing::trace!(?view, ?window, "element became first responder");
        if let Some(window) = window {
            self.publish(window, Some(view));
        }
    }

    /// Element entry point: `view` resigned first responder in `window`.
    pub fn resigned_focus(&mut self, view: V, window: Option<W>) {
        tracing::trace!(?view, ?window, "element resigned first responder");
        if let Some(window) = window {
            self.publish(window, None);
        }
    }

    /// Move pending changes for `observer` into `out`, oldest first.
    pub fn poll(&mut self, observer: &HubObserver, out: &mut Vec<Option<V>>) {
        if let Some(s) = self.subscribers.iter_mut().find(|s| s.id == observer.id) {
            out.append(&mut s.pending);
        }
    }

    fn publish(&mut self, window: W, change: Option<V>) {
        self.subscribers.retain(|s| s.token.strong_count() > 0);
        for s in self.subscribers.iter_mut().filter(|s| s.window == window) {
            s.pending.push(change);
        }
    }
}
