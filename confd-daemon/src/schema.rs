//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

//! The one schema module confd ships with, built programmatically (spec
//! §1 Non-goals scope the YANG compiler that would normally produce this
//! out; see `confd_schema::Schema`'s own doc comment on the two supported
//! ways to populate it).

use confd_schema::{LeafType, Node, NodeKind, Ordering, Schema};

pub fn bootstrap() -> Schema {
    let mut root = Node::new("", NodeKind::Container).with_module("root");
    root.presence = true;

    root.add_child(system());
    root.add_child(interfaces());

    Schema::new(root)
}

fn system() -> Node {
    let mut system = Node::new("system", NodeKind::Container).with_module("system");
    system.presence = false;

    let mut hostname = Node::new("hostname", NodeKind::Leaf);
    hostname.leaf_type = Some(LeafType::String { length: vec![(1, Some(64))], patterns: vec![] });
    hostname.default = Some("confd".into());
    system.add_child(hostname);

    let mut user = Node::new("user", NodeKind::List);
    user.keys = vec!["name".into()];
    user.ordered_by = Ordering::System;

    let mut user_name = Node::new("name", NodeKind::Leaf);
    user_name.leaf_type = Some(LeafType::String { length: vec![(1, None)], patterns: vec![] });
    user_name.mandatory = true;
    user.add_child(user_name);

    let mut password = Node::new("password", NodeKind::Leaf);
    password.leaf_type = Some(LeafType::String { length: vec![], patterns: vec![] });
    password.secret = true;
    user.add_child(password);

    system.add_child(user);
    system
}

fn interfaces() -> Node {
    let mut interfaces = Node::new("interfaces", NodeKind::Container).with_module("interfaces");
    interfaces.presence = false;

    let mut iface = Node::new("interface", NodeKind::List);
    iface.keys = vec!["name".into()];
    iface.ordered_by = Ordering::User;

    let mut iface_name = Node::new("name", NodeKind::Leaf);
    iface_name.leaf_type = Some(LeafType::String { length: vec![], patterns: vec![] });
    iface_name.mandatory = true;
    iface.add_child(iface_name);

    let mut mtu = Node::new("mtu", NodeKind::Leaf);
    mtu.leaf_type = Some(LeafType::Int64 { ranges: vec![(68, 9192)] });
    mtu.default = Some("1500".into());
    iface.add_child(mtu);

    let mut address = Node::new("address", NodeKind::LeafList);
    address.leaf_type = Some(LeafType::String { length: vec![], patterns: vec![] });
    address.ordered_by = Ordering::User;
    iface.add_child(address);

    interfaces.add_child(iface);
    interfaces
}

#[cfg(test)]
mod tests {
    use confd_utils::Path;

    use super::*;

    #[test]
    fn bootstrap_schema_resolves_mtu_through_the_interface_list() {
        let schema = bootstrap();
        let path = Path::parse("interfaces/interface/eth0/mtu");
        assert_eq!(schema.descendant(&path).unwrap().name, "mtu");
    }

    #[test]
    fn bootstrap_schema_flags_password_as_secret() {
        let schema = bootstrap();
        let path = Path::parse("system/user/admin/password");
        assert!(schema.descendant(&path).unwrap().secret);
    }
}
