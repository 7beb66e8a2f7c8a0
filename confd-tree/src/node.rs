//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;

use confd_schema::Ordering;

/// A single configuration-tree node (spec §3 "Node"): `(name, kind,
/// children_ordered)`. Unlike [`confd_schema::Node`] this carries live
/// data, not schema, and a node simply doesn't exist in the tree when its
/// corresponding configuration isn't set — there is no "absent" variant.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A container, presence or non-presence alike. Presence containers
    /// only ever appear here when explicitly created; the spec's
    /// distinction between the two is carried by the schema, not by this
    /// enum (spec §3 invariants).
    Container(Container),
    /// A list, keyed by its schema-declared key leaves. Entries are kept
    /// in the order given by `ordered_by`; `System` ordering is restored
    /// by a natural sort of the key tuple on every mutation, `User`
    /// ordering simply preserves insertion order. Each entry is always a
    /// `Node::Container` carrying its key leaves as regular children
    /// (spec §3 "list-entries carry their key-leaf as a regular child").
    List {
        ordered_by: Ordering,
        entries: Vec<(Vec<String>, Node)>,
    },
    /// A leaf with no value node (string/empty types aside, only
    /// `empty`-typed leaves take this form — spec §3 "0 or 1 value-node
    /// child, 1 except for empty-typed leaves").
    LeafEmpty,
    /// A leaf with its single value-node child.
    Leaf(String),
    /// A leaf-list; values are unique, order per `ordered_by` (spec §3).
    LeafList {
        ordered_by: Ordering,
        values: Vec<String>,
    },
    /// A tombstone: `path` was explicitly deleted in this (candidate)
    /// tree and must not inherit a value from running on merge. Never
    /// appears in a bare running tree or in a `Merge` result — only
    /// `confd-view`'s overlay writes these (spec §4.C).
    Deleted,
}

/// An ordered map of named children, shared by the root, containers and
/// list-entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Container {
    children: BTreeMap<String, Node>,
    order: Vec<String>,
}

impl Container {
    pub fn new() -> Self {
        Container::default()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Inserts or replaces a named child, preserving the existing
    /// position if the name was already present.
    pub fn insert(&mut self, name: impl Into<String>, node: Node) {
        let name = name.into();
        if !self.children.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.children.insert(name, node);
    }

    pub fn remove(&mut self, name: &str) -> Option<Node> {
        let node = self.children.remove(name)?;
        self.order.retain(|n| n != name);
        Some(node)
    }

    /// Children in insertion order (the order mutations occurred in;
    /// schema-declared order is `confd_schema::Node::children_in_order`
    /// and is used instead wherever emission needs to match schema order,
    /// e.g. the Action Runner).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.order.iter().map(|name| (name.as_str(), self.children.get(name).unwrap()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl Node {
    pub fn container() -> Self {
        Node::Container(Container::new())
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Node::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut Container> {
        match self {
            Node::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_leaf_value(&self) -> Option<&str> {
        match self {
            Node::Leaf(v) => Some(v.as_str()),
            Node::LeafEmpty => Some(""),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<(&Ordering, &Vec<(Vec<String>, Node)>)> {
        match self {
            Node::List { ordered_by, entries } => Some((ordered_by, entries)),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<(&Ordering, &mut Vec<(Vec<String>, Node)>)> {
        match self {
            Node::List { ordered_by, entries } => Some((ordered_by, entries)),
            _ => None,
        }
    }

    pub fn as_leaf_list(&self) -> Option<&[String]> {
        match self {
            Node::LeafList { values, .. } => Some(values),
            _ => None,
        }
    }
}

/// Re-sorts `entries` by key tuple in place if `ordered_by` is `System`;
/// a no-op for `User` ordering, which preserves insertion order.
pub fn resort_if_system(ordered_by: Ordering, entries: &mut [(Vec<String>, Node)]) {
    if ordered_by == Ordering::System {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
    }
}
