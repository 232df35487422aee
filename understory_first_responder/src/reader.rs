// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reader: aggregates a subtree's probe reports and hands the chain to its content.
//!
//! A [`ResponderReader`] sits at the root of a declarative subtree. Whenever the
//! merged [`ResponderPreferences`] of that subtree change, the declarative
//! layer forwards them with [`ResponderReader::update`] (or the two halves with
//! [`found_changed`](ResponderReader::found_changed) and
//! [`expected_changed`](ResponderReader::expected_changed)). Each reader writes
//! under its own [`ScopeKey`], so several readers can share one chain without
//! overwriting each other's reports.
//!
//! The reader's content receives the [`SharedChain`] through
//! [`render`](ResponderReader::render), the way an environment object would be
//! injected into descendants.
//!
//! Dropping a reader withdraws its reports from the chain.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use crate::chain::{ChainConfig, ResponderChain, SharedChain};
use crate::native::NativeToolkit;
use crate::preferences::{ExpectedResponder, FoundResponder, ResponderPreferences};
use crate::registry::ScopeKey;

/// When a reader's content is rendered again.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ReloadContent {
    /// Render whenever the chain's focused tag or registry changes.
    #[default]
    EachChange,
    /// Render once; the content observes the chain on its own.
    OnlyInitialValue,
}

/// Aggregates probe reports for one subtree into a [`ResponderChain`].
pub struct ResponderReader<T, N>
where
    T: Clone + Eq + Hash + Debug,
    N: NativeToolkit,
{
    scope: ScopeKey,
    reload: ReloadContent,
    chain: SharedChain<T, N>,
    /// Chain revision at the last render.
    rendered: Option<u64>,
}

impl<T, N> Debug for ResponderReader<T, N>
where
    T: Clone + Eq + Hash + Debug,
    N: NativeToolkit,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResponderReader")
            .field("scope", &self.scope)
            .field("reload", &self.reload)
            .field("rendered", &self.rendered)
            .finish_non_exhaustive()
    }
}

impl<T, N> ResponderReader<T, N>
where
    T: Clone + Eq + Hash + Debug,
    N: NativeToolkit,
{
    /// Create a reader that owns a fresh chain.
    pub fn new(reload: ReloadContent) -> Self {
        Self::with_config(ChainConfig::default(), reload)
    }

    /// Create a reader that owns a fresh chain built with `config`.
    pub fn with_config(config: ChainConfig, reload: ReloadContent) -> Self {
        Self {
            scope: ScopeKey::next(),
            reload,
            chain: ResponderChain::with_config(config).into_shared(),
            rendered: None,
        }
    }

    /// Create a reader that feeds a chain owned by the caller.
    ///
    /// The caller already observes `chain`, so content is rendered once
    /// ([`ReloadContent::OnlyInitialValue`]).
    pub fn writing_into(chain: SharedChain<T, N>) -> Self {
        Self {
            scope: ScopeKey::next(),
            reload: ReloadContent::OnlyInitialValue,
            chain,
            rendered: None,
        }
    }

    /// The key this reader's reports are stored under.
    pub fn scope(&self) -> ScopeKey {
        self.scope
    }

    /// The reader's reload policy.
    pub fn reload_content(&self) -> ReloadContent {
        self.reload
    }

    /// The chain this reader feeds.
    pub fn chain(&self) -> &SharedChain<T, N> {
        &self.chain
    }

    /// Forward the subtree's found reports.
    ///
    /// Windows owning a reported view get a focus bridge attached.
    pub fn found_changed(&mut self, reports: Vec<FoundResponder<T, N::View>>, toolkit: &mut N) {
        tracing::trace!(scope = ?self.scope, count = reports.len(), "found responders changed");
        self.chain
            .borrow_mut()
            .set_found_for_scope(self.scope, reports, toolkit);
    }

    /// Forward the subtree's expected reports.
    pub fn expected_changed(&mut self, reports: Vec<ExpectedResponder<T>>) {
        tracing::trace!(scope = ?self.scope, count = reports.len(), "expected responders changed");
        self.chain
            .borrow_mut()
            .set_expected_for_scope(self.scope, reports);
    }

    /// Forward both halves of the subtree's merged preferences.
    pub fn update(&mut self, preferences: ResponderPreferences<T, N::View>, toolkit: &mut N) {
        let ResponderPreferences { found, expected } = preferences;
        self.found_changed(found, toolkit);
        self.expected_changed(expected);
    }

    /// Whether [`render`](Self::render) would call its content now.
    pub fn needs_render(&self) -> bool {
        match (self.reload, self.rendered) {
            (_, None) => true,
            (ReloadContent::OnlyInitialValue, Some(_)) => false,
            (ReloadContent::EachChange, Some(revision)) => {
                revision != self.chain.borrow().revision()
            }
        }
    }

    /// Render `content` with the chain if the reload policy asks for it.
    ///
    /// Returns `None` when nothing needed rendering.
    pub fn render<R>(&mut self, content: impl FnOnce(&SharedChain<T, N>) -> R) -> Option<R> {
        if !self.needs_render() {
            return None;
        }
        let out = content(&self.chain);
        // Content may have written the chain; the next change is what counts.
        self.rendered = Some(self.chain.borrow().revision());
        Some(out)
    }
}

impl<T, N> Drop for ResponderReader<T, N>
where
    T: Clone + Eq + Hash + Debug,
    N: NativeToolkit,
{
    fn drop(&mut self) {
        if let Ok(mut chain) = self.chain.try_borrow_mut() {
            chain.clear_scope(self.scope);
        } else {
            tracing::warn!(
                scope = ?self.scope,
                "chain is borrowed while dropping reader; its reports stay registered"
            );
        }
    }
}
