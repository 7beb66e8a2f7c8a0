//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;

/// How a list or leaf-list orders its entries (spec §3 invariants).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ordering {
    /// Insertion order is preserved.
    User,
    /// Entries are kept in natural sort order.
    System,
}

/// A compiled YANG type, reduced to the facts the [`crate::validate`] table
/// (spec §4.F) needs. Ranges are inclusive multi-range as the spec
/// requires for both integers and `decimal64`.
#[derive(Clone, Debug)]
pub enum LeafType {
    Int64 {
        ranges: Vec<(i64, i64)>,
    },
    Decimal64 {
        fraction_digits: u8,
        ranges: Vec<(i64, i64)>,
    },
    String {
        /// Inclusive `(min, max)` length ranges; `max = None` means
        /// unbounded.
        length: Vec<(usize, Option<usize>)>,
        /// Anchored regular expressions (full-string match).
        patterns: Vec<String>,
    },
    Boolean,
    Empty,
    Enumeration(Vec<String>),
    /// The value must resolve to some value at the referenced path,
    /// evaluated against the post-edit union view (spec §4.F "Leafref").
    Leafref(String),
    /// First matching branch wins (spec §4.F "union").
    Union(Vec<LeafType>),
}

/// Shell-command hooks attached to a node (spec §4.G).
#[derive(Clone, Debug, Default)]
pub struct Hooks {
    pub begin: Option<String>,
    pub create: Option<String>,
    pub update: Option<String>,
    pub delete: Option<String>,
    pub end: Option<String>,
    pub validate: Option<String>,
}

impl Hooks {
    pub fn is_empty(&self) -> bool {
        self.begin.is_none()
            && self.create.is_none()
            && self.update.is_none()
            && self.delete.is_none()
            && self.end.is_none()
            && self.validate.is_none()
    }
}

/// A `must` or `when` XPath constraint carried on a node, with the
/// optional custom message the schema author attached to it (spec §4.F,
/// §7 `MustViolation`/`WhenViolation`).
#[derive(Clone, Debug)]
pub struct Constraint {
    pub expr: String,
    pub error_message: Option<String>,
}

impl Constraint {
    pub fn new(expr: impl Into<String>) -> Self {
        Constraint {
            expr: expr.into(),
            error_message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// The structural kind of a schema node. Whether a container has presence
/// is tracked as a field on [`Node`] rather than a separate kind, since
/// YANG expresses it as a substatement, not a different node type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeKind {
    Container,
    List,
    Leaf,
    LeafList,
    Choice,
    Case,
}

/// A single schema node: the compiled, read-only representation that
/// backs every component in §4 (spec §4.A "Schema Model").
#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub children: BTreeMap<String, Node>,
    /// Child order as declared, since `BTreeMap` iteration is
    /// alphabetical and schema order matters for the Action Runner
    /// (spec §4.G "depth-first schema order").
    pub child_order: Vec<String>,

    // Container-only.
    pub presence: bool,

    // List/leaf-list-only.
    pub keys: Vec<String>,
    pub ordered_by: Ordering,
    pub min_elements: Option<u32>,
    pub max_elements: Option<u32>,
    /// `unique "a b c"` statements: each entry is the whitespace-split
    /// list of relative descendant paths (spec §4.F "unique").
    pub unique: Vec<Vec<String>>,

    // Leaf/leaf-list-only.
    pub leaf_type: Option<LeafType>,
    pub default: Option<String>,
    pub mandatory: bool,

    // Extensions common to any node (spec §4.A).
    pub priority: Option<u32>,
    pub secret: bool,
    pub normalize: Option<String>,
    pub hooks: Hooks,
    pub must: Vec<Constraint>,
    pub when: Option<Constraint>,
    pub description: Option<String>,
    /// YANG module owning this node. Only meaningful (and only ever set)
    /// on top-level nodes, where it drives `ListActiveModels` (spec
    /// §4.A).
    pub module: Option<String>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Node {
            name: name.into(),
            kind,
            children: BTreeMap::new(),
            child_order: Vec::new(),
            presence: false,
            keys: Vec::new(),
            ordered_by: Ordering::System,
            min_elements: None,
            max_elements: None,
            unique: Vec::new(),
            leaf_type: None,
            default: None,
            mandatory: false,
            priority: None,
            secret: false,
            normalize: None,
            hooks: Hooks::default(),
            must: Vec::new(),
            when: None,
            description: None,
            module: None,
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn add_child(&mut self, child: Node) -> &mut Self {
        self.child_order.push(child.name.clone());
        self.children.insert(child.name.clone(), child);
        self
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    /// Looks up a data-node child by name, transparently descending
    /// through `Choice`/`Case` wrappers: those aren't themselves data
    /// nodes, so a path never names them (spec §4.F "Choice").
    pub fn resolve_child(&self, name: &str) -> Option<&Node> {
        if let Some(direct) = self.children.get(name) {
            return Some(direct);
        }
        for child in self.children.values() {
            if matches!(child.kind, NodeKind::Choice | NodeKind::Case) {
                if let Some(found) = child.resolve_child(name) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// All `(case_name, case_node)` pairs belonging to a `Choice` node,
    /// in schema order.
    pub fn cases(&self) -> impl Iterator<Item = &Node> {
        self.children_in_order().filter(|n| n.kind == NodeKind::Case)
    }

    pub fn children_in_order(&self) -> impl Iterator<Item = &Node> {
        self.child_order.iter().filter_map(|name| self.children.get(name))
    }

    /// Non-presence containers are logically present whenever any
    /// configurable descendant is set; presence containers are absent
    /// unless explicitly created (spec §3 invariants). This flag says
    /// whether the node itself carries explicit presence semantics.
    pub fn is_np_container(&self) -> bool {
        self.kind == NodeKind::Container && !self.presence
    }

    pub fn effective_priority(&self) -> u32 {
        self.priority.unwrap_or(500)
    }

    /// Resolves the normalized form of a raw leaf value by invoking the
    /// node's `normalize` shell hook, if any. Identity if unset.
    pub fn normalize_value(&self, raw: &str) -> std::io::Result<String> {
        let Some(cmd) = &self.normalize else {
            return Ok(raw.to_owned());
        };
        crate::hook::run_filter(cmd, raw)
    }
}
