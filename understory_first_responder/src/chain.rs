// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The responder chain: single source of truth for which tag is focused.
//!
//! ## Overview
//!
//! [`ResponderChain`] reconciles three drivers of the current tag:
//!
//! - **Application writes** via [`ResponderChain::set_first_responder`]. These
//!   are applied to the native toolkit: focus the tag's view, or resign focus
//!   when the new value is `None`.
//! - **Native focus changes** delivered through the [`FocusBridge`] and mapped
//!   to a tag by the [resolver](crate::resolver). These are *quiet* writes:
//!   [`ResponderChain::native_focus_changed`] only receives the toolkit by
//!   shared reference, so it cannot issue native commands and cannot start a
//!   feedback loop.
//! - **Retries** for tags a probe has announced but not yet found. The write is
//!   re-attempted on later [turns](ResponderChain::turn), at most
//!   [`ChainConfig::retry_turns`] times.
//!
//! ## Failure policy
//!
//! No write fails towards the caller. When a requested tag cannot be focused
//! (unknown or stale tag, expected tag that never appeared, or the toolkit
//! refusing the command) the current tag becomes `None` without any further
//! native command, and a [`Diagnostic`] is logged and kept in a short history.
//!
//! The focus changes a native command produces are consumed right after the
//! command, so [`turn`](ResponderChain::turn) only sees changes the chain did
//! not cause. Several writes between turns leave the last one standing.
//!
//! ## Writing while retrying
//!
//! A write that arrives while a retry is outstanding is accepted, but it is not
//! applied immediately: the outstanding retry will apply whatever the current
//! tag is on its next turn. This is a hazard, not a queue. It is always
//! reported with [`Diagnostic::WriteWhileRetrying`]; use
//! [`ResponderChain::after_retrying`] to sequence writes instead.
//!
//! ## Threading
//!
//! A chain and its [`SharedChain`] handle are neither `Send` nor `Sync`, so all
//! mutation stays on the thread that runs the UI scheduler.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashSet;

use crate::bridge::FocusBridge;
use crate::native::NativeToolkit;
use crate::preferences::{ExpectedResponder, FoundResponder};
use crate::registry::{ScopeKey, TagRegistry};
use crate::resolver;

/// Default number of scheduler turns to wait for an expected tag.
///
/// On the first turn the native view is added and the probe finds it; on the
/// second the probe's report reaches the reader.
pub const DEFAULT_RETRY_TURNS: u8 = 2;

/// Number of diagnostics kept by [`ResponderChain::take_diagnostics`].
const DIAGNOSTIC_HISTORY: usize = 32;

/// Construction-time configuration of a [`ResponderChain`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChainConfig {
    /// Turns to keep retrying a write whose tag is expected but not yet registered.
    pub retry_turns: u8,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            retry_turns: DEFAULT_RETRY_TURNS,
        }
    }
}

/// Something the chain could not do, or chose not to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic<T> {
    /// The write did not change the tag, so nothing was sent to the toolkit.
    NoAct {
        /// The unchanged tag.
        tag: T,
    },
    /// The tag has no registered view and no probe expects one.
    UnknownTag {
        /// The requested tag.
        tag: T,
    },
    /// The tag's registered view can no longer take focus and no probe expects a new one.
    StaleResponder {
        /// The requested tag.
        tag: T,
    },
    /// The tag was expected, but no view was registered within the retry budget.
    ExpectedTimedOut {
        /// The requested tag.
        tag: T,
    },
    /// The toolkit refused to focus the tag's view.
    ApplyFailed {
        /// The requested tag.
        tag: T,
    },
    /// The tag was written while a retry was outstanding; the outcome is unspecified.
    WriteWhileRetrying {
        /// The newly written value.
        requested: Option<T>,
        /// The value the outstanding retry was started for.
        pending: Option<T>,
    },
    /// Focus was cleared, but no native view was known to hold it.
    NothingToResign,
}

/// A chain shared between a reader and the views below it.
pub type SharedChain<T, N> = Rc<RefCell<ResponderChain<T, N>>>;

type Deferred<T, N> = Box<dyn FnOnce(&mut ResponderChain<T, N>, &mut N)>;

/// What a native command left behind.
#[derive(Copy, Clone, Debug)]
enum Settled<V> {
    Focused(V),
    Resigned,
    Failed,
}

#[derive(Clone, Debug)]
struct PendingRetry<T> {
    /// Value before the write that started retrying.
    old: Option<T>,
    remaining: u8,
}

/// Tag-based first responder state synchronized with a native toolkit.
pub struct ResponderChain<T, N: NativeToolkit> {
    config: ChainConfig,
    first_responder: Option<T>,
    registry: TagRegistry<T, N::View>,
    bridge: FocusBridge<N>,
    /// Last first responder reported by the bridge, tagged or not.
    actual_first_responder: Option<N::View>,
    retry: Option<PendingRetry<T>>,
    deferred: Vec<Deferred<T, N>>,
    diagnostics: VecDeque<Diagnostic<T>>,
    revision: u64,
}

impl<T: Debug, N: NativeToolkit> Debug for ResponderChain<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResponderChain")
            .field("config", &self.config)
            .field("first_responder", &self.first_responder)
            .field("actual_first_responder", &self.actual_first_responder)
            .field("retrying", &self.retry.is_some())
            .field("deferred", &self.deferred.len())
            .field("revision", &self.revision)
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}

impl<T, N> Default for ResponderChain<T, N>
where
    T: Clone + Eq + Hash + Debug,
    N: NativeToolkit,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, N> ResponderChain<T, N>
where
    T: Clone + Eq + Hash + Debug,
    N: NativeToolkit,
{
    /// Create a chain with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ChainConfig::default())
    }

    /// Create a chain with an explicit configuration.
    pub fn with_config(config: ChainConfig) -> Self {
        Self {
            config,
            first_responder: None,
            registry: TagRegistry::new(),
            bridge: FocusBridge::new(),
            actual_first_responder: None,
            retry: None,
            deferred: Vec::new(),
            diagnostics: VecDeque::new(),
            revision: 0,
        }
    }

    /// Wrap the chain so it can be handed to readers and views.
    pub fn into_shared(self) -> SharedChain<T, N> {
        Rc::new(RefCell::new(self))
    }

    /// The configuration this chain was built with.
    pub fn config(&self) -> ChainConfig {
        self.config
    }

    /// The focused tag, if any.
    pub fn first_responder(&self) -> Option<&T> {
        self.first_responder.as_ref()
    }

    /// Whether `tag` is the focused tag.
    pub fn is_first_responder(&self, tag: &T) -> bool {
        self.first_responder.as_ref() == Some(tag)
    }

    /// Tags whose registered view can currently take focus.
    ///
    /// This is evaluated on every call, so a view that stops being focusable
    /// drops out without being re-registered.
    pub fn available_responders(&self, toolkit: &N) -> HashSet<T> {
        self.registry
            .iter()
            .filter(|(_, view)| toolkit.can_become_focused(*view))
            .map(|(tag, _)| tag.clone())
            .collect()
    }

    /// Tag of the closest registered ancestor-or-self of `view`.
    pub fn responder_tag(&self, view: Option<N::View>, toolkit: &N) -> Option<T> {
        resolver::resolve(&self.registry, view, toolkit)
    }

    /// The merged registry fed by readers.
    pub fn registry(&self) -> &TagRegistry<T, N::View> {
        &self.registry
    }

    /// The bridge delivering native focus changes.
    pub fn bridge(&self) -> &FocusBridge<N> {
        &self.bridge
    }

    /// Whether a write is waiting for an expected tag to be registered.
    pub fn is_retrying(&self) -> bool {
        self.retry.is_some()
    }

    /// Counter bumped whenever the focused tag or the registry changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Drain the recent diagnostics, oldest first.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic<T>> {
        self.diagnostics.drain(..).collect()
    }

    /// Application write: focus `tag`'s view, or resign focus for `None`.
    ///
    /// Writing the current tag again does nothing. Writing `None` always
    /// attempts to resign, even if no tag is focused, so focus held by an
    /// untagged view can be cleared.
    pub fn set_first_responder(&mut self, tag: Option<T>, toolkit: &mut N) {
        if self.retry.is_some() {
            tracing::warn!(
                requested = ?tag,
                pending = ?self.first_responder,
                "first responder written while still retrying an expected responder; \
                 the outcome is undefined, use `after_retrying` to wait for the retry"
            );
            self.record(Diagnostic::WriteWhileRetrying {
                requested: tag.clone(),
                pending: self.first_responder.clone(),
            });
            self.replace_first_responder(tag);
            return;
        }
        let old = self.replace_first_responder(tag);
        self.apply(old, self.config.retry_turns, toolkit);
    }

    /// Quiet write from a native focus change: never issues native commands.
    ///
    /// Changes are dropped while a retry is outstanding; the retry decides the
    /// outcome.
    pub fn native_focus_changed(&mut self, view: Option<N::View>, toolkit: &N) {
        self.actual_first_responder = view;
        if self.retry.is_some() {
            tracing::trace!(?view, "dropping native focus change while retrying");
            return;
        }
        let tag = resolver::resolve(&self.registry, view, toolkit);
        tracing::trace!(?view, ?tag, "native first responder changed");
        self.replace_first_responder(tag);
    }

    /// Poll the bridge and apply every pending native change as a quiet write.
    ///
    /// Returns the number of changes applied.
    pub fn pump_native(&mut self, toolkit: &mut N) -> usize {
        self.bridge.poll(toolkit);
        let mut applied = 0;
        while let Some(change) = self.bridge.next_change() {
            self.native_focus_changed(change.view, toolkit);
            applied += 1;
        }
        applied
    }

    /// Run one scheduler turn.
    ///
    /// Pending native changes are applied first, then an outstanding retry is
    /// attempted, then deferred [`after_retrying`](Self::after_retrying)
    /// callbacks run if no retry remains.
    pub fn turn(&mut self, toolkit: &mut N) {
        self.pump_native(toolkit);
        if let Some(PendingRetry { old, remaining }) = self.retry.take() {
            self.apply(old, remaining, toolkit);
        }
        if self.retry.is_some() || self.deferred.is_empty() {
            return;
        }
        let mut pending = core::mem::take(&mut self.deferred).into_iter();
        while self.retry.is_none() {
            let Some(callback) = pending.next() else {
                break;
            };
            callback(self, toolkit);
        }
        let queued_meanwhile = core::mem::take(&mut self.deferred);
        self.deferred.extend(pending);
        self.deferred.extend(queued_meanwhile);
    }

    /// Run `callback` once no retry is outstanding.
    ///
    /// When idle the callback runs immediately; otherwise it runs at the end of
    /// the first [`turn`](Self::turn) that leaves the chain idle. At that point
    /// a `None` first responder means the retried write did not succeed.
    pub fn after_retrying(
        &mut self,
        toolkit: &mut N,
        callback: impl FnOnce(&mut Self, &mut N) + 'static,
    ) {
        if self.retry.is_some() {
            self.deferred.push(Box::new(callback));
        } else {
            callback(self, toolkit);
        }
    }

    /// Replace the found reports of one reader scope and observe new windows.
    pub(crate) fn set_found_for_scope(
        &mut self,
        scope: ScopeKey,
        reports: Vec<FoundResponder<T, N::View>>,
        toolkit: &mut N,
    ) {
        let windows: Vec<N::Window> = reports
            .iter()
            .filter_map(|r| toolkit.window_of(r.view))
            .collect();
        if self.registry.set_found(scope, reports) {
            self.bump();
        }
        for window in windows {
            self.bridge.attach(window, toolkit);
        }
    }

    /// Replace the expected reports of one reader scope.
    pub(crate) fn set_expected_for_scope(
        &mut self,
        scope: ScopeKey,
        reports: Vec<ExpectedResponder<T>>,
    ) {
        self.registry.set_expected(scope, reports);
    }

    /// Drop every report of `scope`.
    pub(crate) fn clear_scope(&mut self, scope: ScopeKey) {
        self.registry.set_expected(scope, Vec::new());
        if self.registry.set_found(scope, Vec::new()) {
            self.bump();
        }
    }
}

impl<T, N> ResponderChain<T, N>
where
    T: Clone + Eq + Hash + Debug,
    N: NativeToolkit,
{
    // --- internals ---

    fn apply(&mut self, old: Option<T>, budget: u8, toolkit: &mut N) {
        match self.first_responder.clone() {
            Some(tag) if old.as_ref() == Some(&tag) => {
                tracing::debug!(?tag, "tried setting the same first responder; did not act");
                self.record(Diagnostic::NoAct { tag });
            }
            Some(tag) => self.apply_tag(tag, old, budget, toolkit),
            None => self.resign(old, toolkit),
        }
    }

    fn apply_tag(&mut self, tag: T, old: Option<T>, budget: u8, toolkit: &mut N) {
        let registered = self.registry.view_for(&tag);
        let expected = self.registry.is_expected(&tag);
        match registered {
            Some(view) if toolkit.can_become_focused(view) => {
                tracing::debug!(?tag, ?view, "making first responder");
                if toolkit.make_focused(view) {
                    self.settle(Settled::Focused(view), toolkit);
                } else {
                    tracing::warn!(?tag, ?view, "failed to make first responder");
                    self.record(Diagnostic::ApplyFailed { tag });
                    self.replace_first_responder(None);
                    self.settle(Settled::Failed, toolkit);
                }
            }
            _ if expected && budget > 0 => {
                tracing::debug!(
                    ?tag,
                    turns_left = budget,
                    "responder is expected to appear; retrying next turn"
                );
                self.retry = Some(PendingRetry {
                    old,
                    remaining: budget - 1,
                });
            }
            _ if expected => {
                tracing::warn!(
                    ?tag,
                    retry_turns = self.config.retry_turns,
                    "responder is still expected but ran out of turns to wait; \
                     raise `ChainConfig::retry_turns` to see whether it eventually appears"
                );
                self.record(Diagnostic::ExpectedTimedOut { tag });
                self.replace_first_responder(None);
            }
            Some(view) => {
                tracing::warn!(?tag, ?view, "responder for tag can no longer become focused");
                self.record(Diagnostic::StaleResponder { tag });
                self.replace_first_responder(None);
            }
            None => {
                tracing::warn!(
                    ?tag,
                    "can't find a responder for tag; attach it with `responder_tag`"
                );
                self.record(Diagnostic::UnknownTag { tag });
                self.replace_first_responder(None);
            }
        }
    }

    fn resign(&mut self, old: Option<T>, toolkit: &mut N) {
        let tagged = old.as_ref().and_then(|t| self.registry.view_for(t));
        let actual = self.actual_first_responder;
        let Some(view) = tagged.or(actual) else {
            tracing::debug!(?old, "resigning first responder: no responder found");
            self.record(Diagnostic::NothingToResign);
            return;
        };
        tracing::debug!(?old, ?view, "resigning first responder");
        let mut resigned = toolkit.resign_focus(view);
        if !resigned
            && let Some(actual) = actual
            && actual != view
        {
            tracing::debug!(?actual, "tagged view held no focus; resigning actual first responder");
            resigned = toolkit.resign_focus(actual);
        }
        let settled = if resigned {
            Settled::Resigned
        } else {
            Settled::Failed
        };
        self.settle(settled, toolkit);
    }

    /// Consume the changes a native command produced.
    ///
    /// Its own notifications are applied here as a quiet write, so they can
    /// never be replayed over a later application write.
    fn settle(&mut self, settled: Settled<N::View>, toolkit: &mut N) {
        self.bridge.poll(toolkit);
        let mut last = None;
        for change in self.bridge.drain() {
            last = Some(change.view);
        }
        let holder = match settled {
            Settled::Focused(view) => Some(view),
            Settled::Resigned => None,
            Settled::Failed => {
                if let Some(view) = last {
                    self.actual_first_responder = view;
                }
                return;
            }
        };
        self.actual_first_responder = holder;
        let tag = resolver::resolve(&self.registry, holder, toolkit);
        self.replace_first_responder(tag);
    }

    fn replace_first_responder(&mut self, tag: Option<T>) -> Option<T> {
        let old = core::mem::replace(&mut self.first_responder, tag);
        if old != self.first_responder {
            self.bump();
        }
        old
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn record(&mut self, diagnostic: Diagnostic<T>) {
        if self.diagnostics.len() == DIAGNOSTIC_HISTORY {
            self.diagnostics.pop_front();
        }
        self.diagnostics.push_back(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockToolkit, MockView};
    use alloc::vec;

    type Chain = ResponderChain<&'static str, MockToolkit>;

    struct Fixture {
        toolkit: MockToolkit,
        window: MockView,
        fields: Vec<MockView>,
        chain: Chain,
        scope: ScopeKey,
    }

    fn fixture(tags: &[&'static str]) -> Fixture {
        fixture_with(tags, ChainConfig::default())
    }

    fn fixture_with(tags: &[&'static str], config: ChainConfig) -> Fixture {
        let mut toolkit = MockToolkit::new();
        let window = toolkit.window();
        let fields: Vec<_> = tags.iter().map(|_| toolkit.focusable(window)).collect();
        let mut chain = Chain::with_config(config);
        let scope = ScopeKey::next();
        chain.set_found_for_scope(
            scope,
            tags.iter()
                .zip(&fields)
                .map(|(&tag, &view)| FoundResponder { tag, view })
                .collect(),
            &mut toolkit,
        );
        Fixture {
            toolkit,
            window,
            fields,
            chain,
            scope,
        }
    }

    #[test]
    fn registered_tag_is_focused_and_stays() {
        let Fixture {
            mut toolkit,
            window,
            fields,
            mut chain,
            ..
        } = fixture(&["0", "1", "2"]);

        chain.set_first_responder(Some("1"), &mut toolkit);
        assert_eq!(toolkit.focused_in(window), Some(fields[1]));
        assert_eq!(chain.first_responder(), Some(&"1"));

        chain.turn(&mut toolkit);
        assert_eq!(chain.first_responder(), Some(&"1"), "echo resolves to the same tag");
        assert_eq!(toolkit.focus_commands, vec![fields[1]], "exactly one command");
        assert!(chain.take_diagnostics().is_empty());
    }

    #[test]
    fn unknown_tag_reverts_to_none() {
        let Fixture {
            mut toolkit,
            mut chain,
            ..
        } = fixture(&["0"]);

        chain.set_first_responder(Some("missing"), &mut toolkit);
        assert_eq!(chain.first_responder(), None);
        assert!(toolkit.focus_commands.is_empty());
        assert!(toolkit.resign_commands.is_empty(), "reverting issues no command");
        assert_eq!(
            chain.take_diagnostics(),
            vec![Diagnostic::UnknownTag { tag: "missing" }]
        );
    }

    #[test]
    fn writing_the_same_tag_does_not_act() {
        let Fixture {
            mut toolkit,
            mut chain,
            ..
        } = fixture(&["0"]);
        chain.set_first_responder(Some("0"), &mut toolkit);
        let revision = chain.revision();

        chain.set_first_responder(Some("0"), &mut toolkit);
        assert_eq!(toolkit.focus_commands.len(), 1);
        assert_eq!(chain.revision(), revision);
        assert_eq!(chain.take_diagnostics(), vec![Diagnostic::NoAct { tag: "0" }]);
    }

    #[test]
    fn native_change_is_a_quiet_write() {
        let Fixture {
            mut toolkit,
            fields,
            mut chain,
            ..
        } = fixture(&["0", "1", "2"]);

        toolkit.user_focus(fields[2]);
        chain.pump_native(&mut toolkit);
        assert_eq!(chain.first_responder(), Some(&"2"));
        assert!(toolkit.focus_commands.is_empty());
        assert!(toolkit.resign_commands.is_empty());
    }

    #[test]
    fn focus_on_descendant_resolves_to_container_tag() {
        let mut toolkit = MockToolkit::new();
        let window = toolkit.window();
        let search = toolkit.container(window);
        let editor = toolkit.focusable(search);
        let mut chain = Chain::new();
        chain.set_found_for_scope(
            ScopeKey::next(),
            vec![FoundResponder {
                tag: "search",
                view: search,
            }],
            &mut toolkit,
        );

        toolkit.user_focus(editor);
        chain.turn(&mut toolkit);
        assert_eq!(chain.first_responder(), Some(&"search"));
    }

    #[test]
    fn clearing_resigns_the_old_tags_view() {
        let Fixture {
            mut toolkit,
            window,
            fields,
            mut chain,
            ..
        } = fixture(&["0", "1"]);
        chain.set_first_responder(Some("0"), &mut toolkit);
        chain.turn(&mut toolkit);

        chain.set_first_responder(None, &mut toolkit);
        assert_eq!(toolkit.resign_commands, vec![fields[0]]);
        assert_eq!(toolkit.focused_in(window), None);
        chain.turn(&mut toolkit);
        assert_eq!(chain.first_responder(), None);
    }

    #[test]
    fn clearing_resigns_untagged_focus_holder() {
        let Fixture {
            mut toolkit,
            window,
            mut chain,
            ..
        } = fixture(&["0"]);
        let untagged = toolkit.focusable(window);
        toolkit.user_focus(untagged);
        chain.turn(&mut toolkit);
        assert_eq!(chain.first_responder(), None);

        chain.set_first_responder(None, &mut toolkit);
        assert_eq!(toolkit.resign_commands, vec![untagged]);
        assert_eq!(toolkit.focused_in(window), None);
    }

    #[test]
    fn clearing_with_nothing_focused_reports_it() {
        let Fixture {
            mut toolkit,
            mut chain,
            ..
        } = fixture(&["0"]);
        chain.set_first_responder(None, &mut toolkit);
        assert!(toolkit.resign_commands.is_empty());
        assert_eq!(chain.take_diagnostics(), vec![Diagnostic::NothingToResign]);
    }

    #[test]
    fn refused_focus_reverts_to_none() {
        let Fixture {
            mut toolkit,
            mut chain,
            ..
        } = fixture(&["0", "1"]);
        chain.set_first_responder(Some("0"), &mut toolkit);
        toolkit.refuse_focus = true;

        chain.set_first_responder(Some("1"), &mut toolkit);
        assert_eq!(chain.first_responder(), None, "never falls back to the old tag");
        assert_eq!(
            chain.take_diagnostics(),
            vec![Diagnostic::ApplyFailed { tag: "1" }]
        );

        chain.turn(&mut toolkit);
        assert_eq!(
            chain.first_responder(),
            None,
            "the focus change for \"0\" was consumed by its own write"
        );
    }

    #[test]
    fn earlier_focus_change_does_not_undo_a_failed_write() {
        let Fixture {
            mut toolkit,
            window,
            fields,
            mut chain,
            ..
        } = fixture(&["0", "1"]);
        chain.set_first_responder(Some("1"), &mut toolkit);
        chain.set_first_responder(Some("missing"), &mut toolkit);
        assert_eq!(chain.first_responder(), None);
        assert!(chain.bridge().is_empty(), "no focus change left to replay");

        chain.turn(&mut toolkit);
        assert_eq!(chain.first_responder(), None, "the failed write stands");
        assert_eq!(
            toolkit.focused_in(window),
            Some(fields[1]),
            "reverting issues no native command"
        );
    }

    #[test]
    fn later_write_wins_over_earlier_focus_changes() {
        let Fixture {
            mut toolkit,
            window,
            fields,
            mut chain,
            ..
        } = fixture(&["0", "1"]);
        let start = chain.revision();
        chain.set_first_responder(Some("0"), &mut toolkit);
        chain.set_first_responder(Some("1"), &mut toolkit);

        chain.turn(&mut toolkit);
        assert_eq!(chain.first_responder(), Some(&"1"));
        assert_eq!(toolkit.focused_in(window), Some(fields[1]));
        assert_eq!(
            chain.revision(),
            start + 2,
            "one bump per write, none for the echoes"
        );
    }

    #[test]
    fn stale_view_is_not_focused() {
        let Fixture {
            mut toolkit,
            fields,
            mut chain,
            ..
        } = fixture(&["0"]);
        toolkit.detach(fields[0]);

        chain.set_first_responder(Some("0"), &mut toolkit);
        assert!(toolkit.focus_commands.is_empty());
        assert_eq!(chain.first_responder(), None);
        assert_eq!(
            chain.take_diagnostics(),
            vec![Diagnostic::StaleResponder { tag: "0" }],
            "a registered view that cannot take focus is not an unknown tag"
        );
    }

    #[test]
    fn available_responders_track_focus_capability() {
        let Fixture {
            mut toolkit,
            fields,
            chain,
            ..
        } = fixture(&["0", "1", "2"]);
        let all: HashSet<_> = ["0", "1", "2"].into_iter().collect();
        assert_eq!(chain.available_responders(&toolkit), all);

        toolkit.set_focusable(fields[1], false);
        let without_one: HashSet<_> = ["0", "2"].into_iter().collect();
        assert_eq!(chain.available_responders(&toolkit), without_one);

        toolkit.set_focusable(fields[1], true);
        assert_eq!(chain.available_responders(&toolkit), all);
    }

    #[test]
    fn expected_tag_is_applied_once_after_it_registers() {
        let Fixture {
            mut toolkit,
            window,
            mut chain,
            scope,
            ..
        } = fixture(&[]);
        chain.set_expected_for_scope(scope, vec![ExpectedResponder { tag: "late" }]);

        chain.set_first_responder(Some("late"), &mut toolkit);
        assert!(chain.is_retrying());
        assert!(toolkit.focus_commands.is_empty());
        assert_eq!(chain.first_responder(), Some(&"late"));

        let field = toolkit.focusable(window);
        chain.set_expected_for_scope(scope, Vec::new());
        chain.set_found_for_scope(
            scope,
            vec![FoundResponder {
                tag: "late",
                view: field,
            }],
            &mut toolkit,
        );
        chain.turn(&mut toolkit);
        assert!(!chain.is_retrying());
        chain.turn(&mut toolkit);
        chain.turn(&mut toolkit);

        assert_eq!(toolkit.focus_commands, vec![field], "applied exactly once");
        assert_eq!(toolkit.focused_in(window), Some(field));
        assert_eq!(chain.first_responder(), Some(&"late"));
    }

    #[test]
    fn expected_tag_times_out_after_the_budget() {
        let Fixture {
            mut toolkit,
            mut chain,
            scope,
            ..
        } = fixture(&[]);
        chain.set_expected_for_scope(scope, vec![ExpectedResponder { tag: "late" }]);

        chain.set_first_responder(Some("late"), &mut toolkit);
        chain.turn(&mut toolkit);
        assert!(chain.is_retrying(), "one turn left");
        chain.turn(&mut toolkit);
        assert!(!chain.is_retrying());
        assert_eq!(chain.first_responder(), None);
        assert_eq!(
            chain.take_diagnostics(),
            vec![Diagnostic::ExpectedTimedOut { tag: "late" }]
        );
    }

    #[test]
    fn zero_retry_budget_times_out_immediately() {
        let Fixture {
            mut toolkit,
            mut chain,
            scope,
            ..
        } = fixture_with(&[], ChainConfig { retry_turns: 0 });
        chain.set_expected_for_scope(scope, vec![ExpectedResponder { tag: "late" }]);

        chain.set_first_responder(Some("late"), &mut toolkit);
        assert!(!chain.is_retrying());
        assert_eq!(chain.first_responder(), None);
    }

    #[test]
    fn native_changes_are_dropped_while_retrying() {
        let Fixture {
            mut toolkit,
            fields,
            mut chain,
            scope,
            ..
        } = fixture(&["0"]);
        chain.set_expected_for_scope(scope, vec![ExpectedResponder { tag: "late" }]);
        chain.set_first_responder(Some("late"), &mut toolkit);

        toolkit.user_focus(fields[0]);
        chain.pump_native(&mut toolkit);
        assert_eq!(chain.first_responder(), Some(&"late"));
    }

    #[test]
    fn write_while_retrying_is_flagged_and_left_to_the_retry() {
        let Fixture {
            mut toolkit,
            window,
            fields,
            mut chain,
            scope,
        } = fixture(&["0"]);
        chain.set_expected_for_scope(scope, vec![ExpectedResponder { tag: "late" }]);
        chain.set_first_responder(Some("late"), &mut toolkit);

        chain.set_first_responder(Some("0"), &mut toolkit);
        assert!(toolkit.focus_commands.is_empty(), "no immediate native apply");
        assert_eq!(chain.first_responder(), Some(&"0"));
        assert_eq!(
            chain.take_diagnostics(),
            vec![Diagnostic::WriteWhileRetrying {
                requested: Some("0"),
                pending: Some("late"),
            }]
        );

        chain.turn(&mut toolkit);
        assert!(!chain.is_retrying());
        assert_eq!(toolkit.focused_in(window), Some(fields[0]));
        assert_eq!(chain.first_responder(), Some(&"0"));
    }

    #[test]
    fn after_retrying_runs_immediately_when_idle() {
        let Fixture {
            mut toolkit,
            mut chain,
            ..
        } = fixture(&["0"]);
        let ran = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&ran);
        chain.after_retrying(&mut toolkit, move |_, _| *flag.borrow_mut() = true);
        assert!(*ran.borrow());
    }

    #[test]
    fn after_retrying_waits_for_the_retry_to_finish() {
        let Fixture {
            mut toolkit,
            window,
            mut chain,
            scope,
            ..
        } = fixture(&[]);
        chain.set_expected_for_scope(scope, vec![ExpectedResponder { tag: "late" }]);
        chain.set_first_responder(Some("late"), &mut toolkit);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        chain.after_retrying(&mut toolkit, move |chain, _| {
            log.borrow_mut().push(chain.first_responder().copied());
        });
        assert!(seen.borrow().is_empty());

        chain.turn(&mut toolkit);
        assert!(seen.borrow().is_empty(), "still retrying after the first turn");

        let field = toolkit.focusable(window);
        chain.set_found_for_scope(
            scope,
            vec![FoundResponder {
                tag: "late",
                view: field,
            }],
            &mut toolkit,
        );
        chain.turn(&mut toolkit);
        assert_eq!(*seen.borrow(), vec![Some("late")]);
    }

    #[test]
    fn deferred_callback_can_write_the_chain() {
        let Fixture {
            mut toolkit,
            window,
            fields,
            mut chain,
            scope,
        } = fixture(&["0"]);
        chain.set_expected_for_scope(scope, vec![ExpectedResponder { tag: "late" }]);
        chain.set_first_responder(Some("late"), &mut toolkit);
        chain.after_retrying(&mut toolkit, |chain, toolkit| {
            if chain.first_responder().is_none() {
                chain.set_first_responder(Some("0"), toolkit);
            }
        });

        chain.turn(&mut toolkit);
        chain.turn(&mut toolkit);
        assert_eq!(chain.first_responder(), Some(&"0"));
        assert_eq!(toolkit.focused_in(window), Some(fields[0]));
    }

    #[test]
    fn revision_tracks_observable_changes() {
        let Fixture {
            mut toolkit,
            mut chain,
            ..
        } = fixture(&["0"]);
        let start = chain.revision();
        chain.set_first_responder(Some("0"), &mut toolkit);
        assert_eq!(chain.revision(), start + 1);
        chain.turn(&mut toolkit);
        assert_eq!(chain.revision(), start + 1, "echo of the same tag");
    }

    #[test]
    fn diagnostics_history_is_bounded() {
        let Fixture {
            mut toolkit,
            mut chain,
            ..
        } = fixture(&[]);
        for _ in 0..DIAGNOSTIC_HISTORY + 5 {
            chain.set_first_responder(None, &mut toolkit);
        }
        assert_eq!(chain.take_diagnostics().len(), DIAGNOSTIC_HISTORY);
        assert!(chain.take_diagnostics().is_empty());
    }

    #[test]
    fn bridge_attaches_once_per_window() {
        let Fixture {
            mut toolkit,
            window,
            fields,
            mut chain,
            scope,
        } = fixture(&["0", "1"]);
        chain.set_found_for_scope(
            scope,
            vec![FoundResponder {
                tag: "0",
                view: fields[1],
            }],
            &mut toolkit,
        );
        assert_eq!(chain.bridge().windows(), &[window]);
    }
}
