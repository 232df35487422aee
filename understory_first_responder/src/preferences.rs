// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Preference keys reported by probes and collected by readers.
//!
//! A declarative layer propagates preferences from children to ancestors:
//! each key has a default value, and sibling values are merged with
//! [`PreferenceKey::reduce`]. Both keys here merge by appending, so an
//! ancestor sees every report from its subtree in document order.

use alloc::vec::Vec;
use core::marker::PhantomData;

/// A child-to-ancestor preference with a default value and a merge rule.
pub trait PreferenceKey {
    /// Value type carried by the preference.
    type Value;

    /// Value reported by a subtree that sets nothing.
    fn default_value() -> Self::Value;

    /// Merge the next sibling's value into `value`.
    fn reduce(value: &mut Self::Value, next: Self::Value);
}

/// A tagged view whose native view was found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoundResponder<T, V> {
    /// Application tag.
    pub tag: T,
    /// Native view the tag resolved to.
    pub view: V,
}

/// A tagged view whose native view is expected but not yet found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpectedResponder<T> {
    /// Application tag.
    pub tag: T,
}

/// Preference key for [`FoundResponder`] reports.
#[derive(Copy, Clone, Debug, Default)]
pub struct FoundResponderKey<T, V>(PhantomData<fn() -> (T, V)>);

impl<T, V> PreferenceKey for FoundResponderKey<T, V> {
    type Value = Vec<FoundResponder<T, V>>;

    fn default_value() -> Self::Value {
        Vec::new()
    }

    fn reduce(value: &mut Self::Value, next: Self::Value) {
        value.extend(next);
    }
}

/// Preference key for [`ExpectedResponder`] reports.
#[derive(Copy, Clone, Debug, Default)]
pub struct ExpectedResponderKey<T>(PhantomData<fn() -> T>);

impl<T> PreferenceKey for ExpectedResponderKey<T> {
    type Value = Vec<ExpectedResponder<T>>;

    fn default_value() -> Self::Value {
        Vec::new()
    }

    fn reduce(value: &mut Self::Value, next: Self::Value) {
        value.extend(next);
    }
}

/// Both responder preferences of one subtree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponderPreferences<T, V> {
    /// Reports under [`FoundResponderKey`].
    pub found: Vec<FoundResponder<T, V>>,
    /// Reports under [`ExpectedResponderKey`].
    pub expected: Vec<ExpectedResponder<T>>,
}

impl<T, V> Default for ResponderPreferences<T, V> {
    fn default() -> Self {
        Self {
            found: FoundResponderKey::<T, V>::default_value(),
            expected: ExpectedResponderKey::<T>::default_value(),
        }
    }
}

impl<T, V> ResponderPreferences<T, V> {
    /// Merge a sibling subtree's preferences after these.
    pub fn reduce(&mut self, next: Self) {
        FoundResponderKey::<T, V>::reduce(&mut self.found, next.found);
        ExpectedResponderKey::<T>::reduce(&mut self.expected, next.expected);
    }

    /// Whether neither key carries any report.
    pub fn is_empty(&self) -> bool {
        self.found.is_empty() && self.expected.is_empty()
    }
}

impl<T, V> Extend<Self> for ResponderPreferences<T, V> {
    fn extend<I: IntoIterator<Item = Self>>(&mut self, iter: I) {
        for next in iter {
            self.reduce(next);
        }
    }
}

impl<T, V> FromIterator<Self> for ResponderPreferences<T, V> {
    fn from_iter<I: IntoIterator<Item = Self>>(iter: I) -> Self {
        let mut merged = Self::default();
        merged.extend(iter);
        merged
    }
}
