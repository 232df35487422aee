// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapters implementing [`NativeToolkit`](crate::native::NativeToolkit) for other Understory crates.
//!
//! Each adapter is gated behind a feature flag to keep the core crate free of
//! backend dependencies.
//!
//! ## Available Adapters
//!
//! - [`view_tree`] (`view_tree_adapter` feature): focus through
//!   [`understory_view_tree::ViewTree`], whose windows are its root views.

#[cfg(feature = "view_tree_adapter")]
pub mod view_tree;
