//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

//! A small hand-built schema exercising every scenario in spec §8, shared
//! across this workspace's test suites (enabled by the `testing` feature,
//! matching the teacher's own per-crate `testing` feature convention).

use crate::node::{Constraint, Hooks, LeafType, Node, NodeKind, Ordering};
use crate::schema::Schema;

/// Builds the sample schema used by scenarios 1, 2 and 6 of spec §8: a
/// `protocols/ospf/area` list keyed by `area-id`, with a `network`
/// leaf-list and per-container commit priorities.
pub fn sample_schema() -> Schema {
    let mut root = Node::new("", NodeKind::Container).with_module("root");
    root.presence = true;

    let mut protocols = Node::new("protocols", NodeKind::Container).with_module("test-protocols");
    protocols.presence = false;

    let mut ospf = Node::new("ospf", NodeKind::Container);
    ospf.priority = Some(300);
    ospf.hooks = Hooks {
        begin: Some("true".into()),
        end: Some("true".into()),
        ..Default::default()
    };

    let mut area = Node::new("area", NodeKind::List);
    area.keys = vec!["area-id".into()];
    area.ordered_by = Ordering::System;

    let mut area_id = Node::new("area-id", NodeKind::Leaf);
    area_id.leaf_type = Some(LeafType::String {
        length: vec![],
        patterns: vec![],
    });
    area_id.mandatory = true;
    area.add_child(area_id);

    let mut network = Node::new("network", NodeKind::LeafList);
    network.leaf_type = Some(LeafType::String {
        length: vec![],
        patterns: vec![],
    });
    network.ordered_by = Ordering::User;
    area.add_child(network);

    ospf.add_child(area);
    protocols.add_child(ospf);
    root.add_child(protocols);

    // Scenario 3: a non-presence container X guarded by a must that
    // references a sibling leaf Y.
    let mut x = Node::new("x", NodeKind::Container);
    x.must.push(
        Constraint::new("not(.) or y")
            .with_message("Y must be set whenever X is configured"),
    );
    let mut y = Node::new("y", NodeKind::Leaf);
    y.leaf_type = Some(LeafType::Empty);
    x.add_child(y);
    root.add_child(x);

    // Scenario 4: a presence container P with a mandatory leaf M.
    let mut p = Node::new("p", NodeKind::Container);
    p.presence = true;
    let mut m = Node::new("m", NodeKind::Leaf);
    m.leaf_type = Some(LeafType::String {
        length: vec![],
        patterns: vec![],
    });
    m.mandatory = true;
    p.add_child(m);
    root.add_child(p);

    // Scenario 5: a server list with a composite key (`name`, `ip`) and a
    // `unique "port"` constraint.
    let mut server = Node::new("server", NodeKind::List);
    server.keys = vec!["name".into(), "ip".into()];
    server.unique.push(vec!["port".into()]);
    let mut name = Node::new("name", NodeKind::Leaf);
    name.leaf_type = Some(LeafType::String {
        length: vec![],
        patterns: vec![],
    });
    name.mandatory = true;
    server.add_child(name);
    let mut port = Node::new("port", NodeKind::Leaf);
    port.leaf_type = Some(LeafType::Int64 {
        ranges: vec![(1, 65535)],
    });
    server.add_child(port);
    let mut ip = Node::new("ip", NodeKind::Leaf);
    ip.leaf_type = Some(LeafType::String {
        length: vec![],
        patterns: vec![],
    });
    ip.mandatory = true;
    server.add_child(ip);
    root.add_child(server);

    // Scenario 6: five containers at priorities 100/200/300/500/900, each
    // with begin/end hooks and one leaf.
    for (cname, prio) in [
        ("c100", 100),
        ("c200", 200),
        ("c300", 300),
        ("c500", 500),
        ("c900", 900),
    ] {
        let mut c = Node::new(cname, NodeKind::Container);
        c.priority = Some(prio);
        c.hooks = Hooks {
            begin: Some(format!("echo begin-{cname}")),
            end: Some(format!("echo end-{cname}")),
            ..Default::default()
        };
        let mut leaf = Node::new("value", NodeKind::Leaf);
        leaf.leaf_type = Some(LeafType::String {
            length: vec![],
            patterns: vec![],
        });
        leaf.hooks.update = Some(format!("echo update-{cname}"));
        c.add_child(leaf);
        root.add_child(c);
    }

    // A secret leaf at the root, for redaction tests.
    let mut password = Node::new("password", NodeKind::Leaf);
    password.leaf_type = Some(LeafType::String {
        length: vec![],
        patterns: vec![],
    });
    password.secret = true;
    root.add_child(password);

    // A leaf with a default value, for default-invisibility tests.
    let mut mtu = Node::new("mtu", NodeKind::Leaf);
    mtu.leaf_type = Some(LeafType::Int64 {
        ranges: vec![(64, 9000)],
    });
    mtu.default = Some("1500".into());
    root.add_child(mtu);

    Schema::new(root)
}
