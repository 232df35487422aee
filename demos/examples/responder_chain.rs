// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tag-based focus over a view tree: a login form and a late-appearing field.
//!
//! This example shows how to combine:
//! - `understory_view_tree` as the native toolkit,
//! - `responder_tag` probes to attach tags to focusable fields,
//! - a `ResponderReader` to aggregate their reports,
//! - the `ResponderChain` to read and write the focused tag.
//!
//! Run:
//! - `cargo run -p understory_demos --example responder_chain`

use tracing::{Level, info};
use understory_first_responder::chain::ResponderChain;
use understory_first_responder::preferences::ResponderPreferences;
use understory_first_responder::probe::{ResponderProbe, responder_tag};
use understory_first_responder::reader::{ReloadContent, ResponderReader};
use understory_view_tree::{ViewFlags, ViewId, ViewTree};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Field {
    User,
    Password,
    Code,
}

/// One tagged field: the focusable view and the host view of its probe.
struct Tagged {
    field: ViewId,
    host: ViewId,
    probe: ResponderProbe<Field, ViewId>,
}

fn add_field(tree: &mut ViewTree, window: ViewId, tag: Field) -> Tagged {
    let field = tree.insert(Some(window), ViewFlags::VISIBLE | ViewFlags::FOCUSABLE);
    let host = tree.insert(Some(window), ViewFlags::VISIBLE);
    Tagged {
        field,
        host,
        probe: responder_tag(tag),
    }
}

fn preferences(fields: &[Tagged]) -> ResponderPreferences<Field, ViewId> {
    fields.iter().map(|t| t.probe.preferences()).collect()
}

fn show(label: &str, chain: &ResponderChain<Field, ViewTree>, tree: &ViewTree, window: ViewId) {
    info!(
        "{label}: tag = {:?}, native = {:?}, available = {:?}",
        chain.first_responder(),
        tree.first_responder(window),
        chain.available_responders(tree),
    );
}

fn main() {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    let mut tree = ViewTree::new();
    let window = tree.insert(None, ViewFlags::VISIBLE);
    let mut fields = vec![
        add_field(&mut tree, window, Field::User),
        add_field(&mut tree, window, Field::Password),
    ];

    // First pass: probes announce their tags, then look for their fields.
    let mut reader = ResponderReader::<Field, ViewTree>::new(ReloadContent::EachChange);
    reader.update(preferences(&fields), &mut tree);
    for tagged in &mut fields {
        tagged.probe.introspect(Some(tagged.host), &tree);
    }
    reader.update(preferences(&fields), &mut tree);

    reader.render(|chain| {
        chain
            .borrow_mut()
            .set_first_responder(Some(Field::User), &mut tree);
    });
    {
        let mut chain = reader.chain().borrow_mut();
        chain.turn(&mut tree);
        show("focused user", &chain, &tree, window);

        // The user tabs into the password field.
        tree.focus(fields[1].field);
        chain.turn(&mut tree);
        show("user moved focus", &chain, &tree, window);
    }

    // The next render adds a field whose probe has not run yet, and the
    // application asks for it straight away.
    fields.push(add_field(&mut tree, window, Field::Code));
    reader.update(preferences(&fields), &mut tree);
    {
        let mut chain = reader.chain().borrow_mut();
        chain.set_first_responder(Some(Field::Code), &mut tree);
        show("code requested", &chain, &tree, window);
    }

    // Materialization runs the new probe; the retry picks the field up.
    if let Some(code) = fields.last_mut() {
        code.probe.introspect(Some(code.host), &tree);
    }
    reader.update(preferences(&fields), &mut tree);
    reader.chain().borrow_mut().turn(&mut tree);
    reader.render(|chain| show("code materialized", &chain.borrow(), &tree, window));

    {
        let mut chain = reader.chain().borrow_mut();
        chain.after_retrying(&mut tree, |chain, tree| {
            chain.set_first_responder(None, tree);
        });
        chain.turn(&mut tree);
        show("cleared", &chain, &tree, window);
        for diagnostic in chain.take_diagnostics() {
            info!("diagnostic: {diagnostic:?}");
        }
    }
}
