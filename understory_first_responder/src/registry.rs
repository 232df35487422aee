// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tag registry: which native view each tag currently stands for.
//!
//! Readers report per scope. The registry keeps every scope's latest reports
//! and flattens them into one tag → view map plus the set of expected tags.
//! Scopes are applied in the order they were last updated, so when two scopes
//! report the same tag the most recently updated scope wins.
//!
//! The mapping is one-to-one: registering a view under a tag drops any other
//! tag that pointed at the same view, and a tag never maps to two views.
//!
//! Entries are never removed because a view went away. A stale handle simply
//! stops answering `true` to
//! [`NativeToolkit::can_become_focused`](crate::native::NativeToolkit::can_become_focused),
//! which is checked whenever it matters.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;
use core::sync::atomic::{AtomicU32, Ordering};

use hashbrown::{HashMap, HashSet};

use crate::preferences::{ExpectedResponder, FoundResponder};

/// Identity of the reader that contributed a set of reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeKey(u32);

impl ScopeKey {
    /// Generate a new unique scope key.
    pub fn next() -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Flattened tag → view map and expected-tag set, fed per scope.
#[derive(Clone, Debug)]
pub struct TagRegistry<T, V> {
    views: HashMap<T, V>,
    tags: HashMap<V, T>,
    expected: HashSet<T>,
    /// Least recently updated first.
    found_by_scope: Vec<(ScopeKey, Vec<FoundResponder<T, V>>)>,
    expected_by_scope: HashMap<ScopeKey, Vec<ExpectedResponder<T>>>,
}

impl<T, V> Default for TagRegistry<T, V> {
    fn default() -> Self {
        Self {
            views: HashMap::new(),
            tags: HashMap::new(),
            expected: HashSet::new(),
            found_by_scope: Vec::new(),
            expected_by_scope: HashMap::new(),
        }
    }
}

impl<T, V> TagRegistry<T, V>
where
    T: Clone + Eq + Hash + Debug,
    V: Copy + Eq + Hash + Debug,
{
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// View registered for `tag`.
    pub fn view_for(&self, tag: &T) -> Option<V> {
        self.views.get(tag).copied()
    }

    /// Tag registered for `view`.
    pub fn tag_for(&self, view: V) -> Option<&T> {
        self.tags.get(&view)
    }

    /// Whether a probe announced that `tag` will resolve soon.
    pub fn is_expected(&self, tag: &T) -> bool {
        self.expected.contains(tag)
    }

    /// Iterate registered `(tag, view)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, V)> + '_ {
        self.views.iter().map(|(t, v)| (t, *v))
    }

    /// Iterate expected tags in unspecified order.
    pub fn expected(&self) -> impl Iterator<Item = &T> + '_ {
        self.expected.iter()
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Whether no tag is registered.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Replace the found reports of `scope` and rebuild the map.
    ///
    /// Returns `false` (and changes nothing) if the reports are unchanged.
    pub fn set_found(&mut self, scope: ScopeKey, reports: Vec<FoundResponder<T, V>>) -> bool {
        let position = self.found_by_scope.iter().position(|(s, _)| *s == scope);
        if let Some(i) = position {
            if self.found_by_scope[i].1 == reports {
                return false;
            }
            self.found_by_scope.remove(i);
        } else if reports.is_empty() {
            return false;
        }
        if !reports.is_empty() {
            self.found_by_scope.push((scope, reports));
        }
        self.rebuild_views();
        true
    }

    /// Replace the expected reports of `scope` and rebuild the expected set.
    ///
    /// Returns `false` (and changes nothing) if the reports are unchanged.
    pub fn set_expected(&mut self, scope: ScopeKey, reports: Vec<ExpectedResponder<T>>) -> bool {
        let unchanged = match self.expected_by_scope.get(&scope) {
            Some(previous) => *previous == reports,
            None => reports.is_empty(),
        };
        if unchanged {
            return false;
        }
        if reports.is_empty() {
            self.expected_by_scope.remove(&scope);
        } else {
            self.expected_by_scope.insert(scope, reports);
        }
        self.expected = self
            .expected_by_scope
            .values()
            .flatten()
            .map(|e| e.tag.clone())
            .collect();
        true
    }

    fn rebuild_views(&mut self) {
        self.views.clear();
        self.tags.clear();
        for (_, reports) in &self.found_by_scope {
            for FoundResponder { tag, view } in reports {
                if let Some(previous) = self.views.insert(tag.clone(), *view)
                    && previous != *view
                {
                    self.tags.remove(&previous);
                }
                if let Some(displaced) = self.tags.insert(*view, tag.clone())
                    && displaced != *tag
                {
                    self.views.remove(&displaced);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn found(tag: &'static str, view: u32) -> FoundResponder<&'static str, u32> {
        FoundResponder { tag, view }
    }

    #[test]
    fn scope_keys_are_unique() {
        let a = ScopeKey::next();
        let b = ScopeKey::next();
        assert_ne!(a, b, "every reader gets its own scope");
        assert!(b > a, "keys are handed out in order");
    }

    #[test]
    fn registers_and_looks_up_both_ways() {
        let mut registry = TagRegistry::new();
        let scope = ScopeKey::next();
        assert!(registry.set_found(scope, vec![found("name", 1), found("email", 2)]));

        assert_eq!(registry.view_for(&"name"), Some(1));
        assert_eq!(registry.tag_for(2), Some(&"email"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unchanged_reports_are_ignored() {
        let mut registry = TagRegistry::new();
        let scope = ScopeKey::next();
        assert!(registry.set_found(scope, vec![found("a", 1)]));
        assert!(!registry.set_found(scope, vec![found("a", 1)]));
        assert!(!registry.set_found(ScopeKey::next(), Vec::new()));
    }

    #[test]
    fn later_report_overwrites_tag_and_view() {
        let mut registry = TagRegistry::new();
        let scope = ScopeKey::next();
        registry.set_found(scope, vec![found("a", 1), found("a", 2), found("b", 2)]);

        // "a" moved to view 2, then "b" claimed view 2.
        assert_eq!(registry.view_for(&"a"), None);
        assert_eq!(registry.view_for(&"b"), Some(2));
        assert_eq!(registry.tag_for(1), None);
        assert_eq!(registry.tag_for(2), Some(&"b"));
    }

    #[test]
    fn most_recently_updated_scope_wins() {
        let mut registry = TagRegistry::new();
        let first = ScopeKey::next();
        let second = ScopeKey::next();

        registry.set_found(first, vec![found("a", 1)]);
        registry.set_found(second, vec![found("a", 2)]);
        assert_eq!(registry.view_for(&"a"), Some(2));

        registry.set_found(first, vec![found("a", 3)]);
        assert_eq!(registry.view_for(&"a"), Some(3));
    }

    #[test]
    fn emptying_a_scope_drops_its_tags() {
        let mut registry = TagRegistry::new();
        let first = ScopeKey::next();
        let second = ScopeKey::next();
        registry.set_found(first, vec![found("a", 1)]);
        registry.set_found(second, vec![found("b", 2)]);

        assert!(registry.set_found(first, Vec::new()));
        assert_eq!(registry.view_for(&"a"), None);
        assert_eq!(registry.view_for(&"b"), Some(2));
    }

    #[test]
    fn expected_set_merges_scopes() {
        let mut registry = TagRegistry::<&'static str, u32>::new();
        let first = ScopeKey::next();
        let second = ScopeKey::next();

        assert!(registry.set_expected(first, vec![ExpectedResponder { tag: "a" }]));
        assert!(registry.set_expected(second, vec![ExpectedResponder { tag: "b" }]));
        assert!(registry.is_expected(&"a") && registry.is_expected(&"b"));

        assert!(registry.set_expected(first, Vec::new()));
        assert!(!registry.is_expected(&"a"));
        assert!(registry.is_expected(&"b"));
        assert!(!registry.set_expected(first, Vec::new()), "already empty");
    }
}
