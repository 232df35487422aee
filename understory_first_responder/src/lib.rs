// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_first_responder --heading-base-level=0

//! Understory First Responder: tag-based focus state kept in sync with a native view tree.
//!
//! ## Overview
//!
//! Application code names focus targets with tags of its own choosing and reads or writes
//! "which tag is focused" on a [`ResponderChain`](chain::ResponderChain). The chain keeps that
//! value in step with the native toolkit's authoritative focus state in both directions:
//!
//! - Writing a tag issues a native focus command for the tag's view, or resigns focus for `None`.
//! - Native focus changes are mapped back to the tag of the closest tagged ancestor-or-self and
//!   written quietly, without issuing commands.
//! - A write for a tag whose view is announced but not yet materialized is retried on later
//!   scheduler turns, within a small budget.
//!
//! The native toolkit is abstracted by [`NativeToolkit`](native::NativeToolkit).
//!
//! ## Pieces
//!
//! - [`probe`]: [`responder_tag`](probe::responder_tag) attaches a tag to the nearest focusable
//!   view rendered just before it, reporting "expected" until it has looked and "found" once it
//!   has a view.
//! - [`preferences`]: the two child-to-ancestor preference keys probes report under.
//! - [`reader`]: [`ResponderReader`](reader::ResponderReader) aggregates a subtree's reports
//!   under its own scope key and hands the shared chain to its content.
//! - [`registry`]: the flattened tag ↔ view map and expected-tag set.
//! - [`resolver`]: maps a focused native view back to a tag.
//! - [`bridge`]: [`FocusBridge`](bridge::FocusBridge) observes each window once and queues its
//!   focus changes; [`InterceptionHub`](bridge::InterceptionHub) builds a per-window stream for
//!   toolkits that only report element-level transitions.
//! - [`chain`]: the synchronization engine.
//!
//! ## Turns
//!
//! Nothing here blocks or spawns. The host calls [`ResponderChain::turn`](chain::ResponderChain::turn)
//! once per turn of its UI scheduler; retries and
//! [`after_retrying`](chain::ResponderChain::after_retrying) callbacks advance only then.
//! The chain is not `Send`, so all of this happens on the UI thread.
//!
//! ## Example
//!
//! ```
//! use understory_first_responder::chain::ResponderChain;
//! use understory_first_responder::preferences::FoundResponder;
//! use understory_first_responder::reader::{ReloadContent, ResponderReader};
//! # use understory_first_responder::bridge::{HubObserver, InterceptionHub};
//! # use understory_first_responder::native::NativeToolkit;
//! # #[derive(Default)]
//! # struct Toolkit { focused: Option<u32>, hub: InterceptionHub<u32, u8> }
//! # impl NativeToolkit for Toolkit {
//! #     type View = u32;
//! #     type Window = u8;
//! #     type Observer = HubObserver;
//! #     fn can_become_focused(&self, _: u32) -> bool { true }
//! #     fn parent_of(&self, _: u32) -> Option<u32> { None }
//! #     fn children_of(&self, _: u32) -> &[u32] { &[] }
//! #     fn window_of(&self, _: u32) -> Option<u8> { Some(0) }
//! #     fn make_focused(&mut self, v: u32) -> bool {
//! #         self.focused = Some(v);
//! #         self.hub.became_focused(v, Some(0));
//! #         true
//! #     }
//! #     fn resign_focus(&mut self, v: u32) -> bool {
//! #         self.focused = None;
//! #         self.hub.resigned_focus(v, Some(0));
//! #         true
//! #     }
//! #     fn observe_focus(&mut self, w: u8) -> HubObserver { self.hub.observe(w) }
//! #     fn unobserve_focus(&mut self, o: HubObserver) { self.hub.unobserve(o) }
//! #     fn poll_focus(&mut self, o: &HubObserver, out: &mut Vec<Option<u32>>) { self.hub.poll(o, out) }
//! # }
//! let mut toolkit = Toolkit::default();
//! let mut reader = ResponderReader::<&str, Toolkit>::new(ReloadContent::EachChange);
//! reader.found_changed(vec![FoundResponder { tag: "email", view: 7 }], &mut toolkit);
//!
//! reader.render(|chain| {
//!     chain.borrow_mut().set_first_responder(Some("email"), &mut toolkit);
//! });
//! assert_eq!(toolkit.focused, Some(7));
//!
//! let mut chain = reader.chain().borrow_mut();
//! chain.turn(&mut toolkit);
//! assert_eq!(chain.first_responder(), Some(&"email"));
//! ```
//!
//! ## Adapters
//!
//! The [`adapters`] module implements the toolkit seam for other Understory crates:
//!
//! - **View Tree Adapter** (`view_tree_adapter` feature): focus through `understory_view_tree`.
//!
//! ## Logging
//!
//! Focus commands, retries and failures are logged with [`tracing`]; failures are also kept as
//! [`Diagnostic`](chain::Diagnostic) values, see
//! [`ResponderChain::take_diagnostics`](chain::ResponderChain::take_diagnostics).
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod adapters;
pub mod bridge;
pub mod chain;
pub mod native;
pub mod preferences;
pub mod probe;
pub mod reader;
pub mod registry;
pub mod resolver;

#[cfg(test)]
mod testing;
