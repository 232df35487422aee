// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording toolkit used by unit tests.
//!
//! Focus notifications go through an [`InterceptionHub`], the way a toolkit
//! without per-window notifications would publish them. Commands issued
//! through [`NativeToolkit`] are recorded so tests can assert that the quiet
//! path never reaches the toolkit.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::bridge::{HubObserver, InterceptionHub};
use crate::native::NativeToolkit;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct MockView(usize);

#[derive(Clone, Debug)]
struct MockNode {
    parent: Option<MockView>,
    children: Vec<MockView>,
    focusable: bool,
    alive: bool,
}

#[derive(Debug)]
pub(crate) struct MockToolkit {
    nodes: Vec<MockNode>,
    focused: HashMap<MockView, MockView>,
    hub: InterceptionHub<MockView, MockView>,
    pub(crate) focus_commands: Vec<MockView>,
    pub(crate) resign_commands: Vec<MockView>,
    pub(crate) refuse_focus: bool,
}

impl MockToolkit {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            focused: HashMap::new(),
            hub: InterceptionHub::new(),
            focus_commands: Vec::new(),
            resign_commands: Vec::new(),
            refuse_focus: false,
        }
    }

    fn add(&mut self, parent: Option<MockView>, focusable: bool) -> MockView {
        let id = MockView(self.nodes.len());
        self.nodes.push(MockNode {
            parent,
            children: Vec::new(),
            focusable,
            alive: true,
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    pub(crate) fn window(&mut self) -> MockView {
        self.add(None, false)
    }

    pub(crate) fn container(&mut self, parent: MockView) -> MockView {
        self.add(Some(parent), false)
    }

    pub(crate) fn focusable(&mut self, parent: MockView) -> MockView {
        self.add(Some(parent), true)
    }

    pub(crate) fn set_focusable(&mut self, view: MockView, focusable: bool) {
        self.nodes[view.0].focusable = focusable;
    }

    /// Detach `view` from its parent; the handle goes stale.
    pub(crate) fn detach(&mut self, view: MockView) {
        if let Some(p) = self.nodes[view.0].parent.take() {
            self.nodes[p.0].children.retain(|c| *c != view);
        }
        self.nodes[view.0].alive = false;
    }

    pub(crate) fn focused_in(&self, window: MockView) -> Option<MockView> {
        self.focused.get(&window).copied()
    }

    /// Simulate the user moving focus, bypassing the recorded commands.
    pub(crate) fn user_focus(&mut self, view: MockView) -> bool {
        self.take_focus(view)
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.hub.observer_count()
    }

    fn root_of(&self, view: MockView) -> MockView {
        let mut current = view;
        while let Some(p) = self.nodes[current.0].parent {
            current = p;
        }
        current
    }

    fn take_focus(&mut self, view: MockView) -> bool {
        if !self.can_become_focused(view) {
            return false;
        }
        let window = self.root_of(view);
        match self.focused.get(&window).copied() {
            Some(current) if current == view => return true,
            Some(current) => self.hub.resigned_focus(current, Some(window)),
            None => {}
        }
        self.focused.insert(window, view);
        self.hub.became_focused(view, Some(window));
        true
    }
}

impl NativeToolkit for MockToolkit {
    type View = MockView;
    type Window = MockView;
    type Observer = HubObserver;

    fn can_become_focused(&self, view: MockView) -> bool {
        self.nodes
            .get(view.0)
            .is_some_and(|n| n.alive && n.focusable)
    }

    fn parent_of(&self, view: MockView) -> Option<MockView> {
        self.nodes.get(view.0).and_then(|n| n.parent)
    }

    fn children_of(&self, view: MockView) -> &[MockView] {
        self.nodes
            .get(view.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    fn window_of(&self, view: MockView) -> Option<MockView> {
        let node = self.nodes.get(view.0)?;
        node.alive.then(|| self.root_of(view))
    }

    fn make_focused(&mut self, view: MockView) -> bool {
        self.focus_commands.push(view);
        !self.refuse_focus && self.take_focus(view)
    }

    fn resign_focus(&mut self, view: MockView) -> bool {
        self.resign_commands.push(view);
        let window = self.root_of(view);
        match self.focused.get(&window).copied() {
            Some(current) if crate::native::is_descendant(self, current, view) => {
                self.focused.remove(&window);
                self.hub.resigned_focus(current, Some(window));
                true
            }
            _ => false,
        }
    }

    fn observe_focus(&mut self, window: MockView) -> HubObserver {
        self.hub.observe(window)
    }

    fn unobserve_focus(&mut self, observer: HubObserver) {
        self.hub.unobserve(observer);
    }

    fn poll_focus(&mut self, observer: &HubObserver, out: &mut Vec<Option<MockView>>) {
        self.hub.poll(observer, out);
    }
}
