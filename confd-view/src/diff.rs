//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use confd_schema::{Node as SchemaNode, NodeKind};
use confd_tree::Node;

/// Per-node change classification (spec §4.D). The root is always
/// `Unchanged`; a container is `Changed` iff any descendant is
/// non-`Unchanged`; leaf-list and list entries are flagged individually as
/// `Added`/`Deleted` rather than diffed value-by-value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DiffStatus {
    Unchanged,
    Added,
    Changed,
    Deleted,
}

/// A single entry in a flattened diff: the path from the diff root, the
/// node's status, and (for `Changed` leaves) the before/after values.
#[derive(Clone, Debug, PartialEq)]
pub struct Diff {
    pub name: String,
    pub status: DiffStatus,
    pub before: Option<String>,
    pub after: Option<String>,
    pub children: Vec<Diff>,
}

/// Computes the diff between `before` and `after` (running and the
/// candidate-over-running merge, typically — spec §4.D). Both trees must
/// already be schema-shaped container nodes at `schema_node`. The root
/// entry's own status is always `Unchanged` regardless of its children
/// (spec §4.D); inspect `children` for what actually moved.
pub fn diff(before: Option<&Node>, after: Option<&Node>, schema_node: &SchemaNode) -> Diff {
    Diff { status: DiffStatus::Unchanged, ..diff_node(before, after, schema_node) }
}

fn diff_node(before: Option<&Node>, after: Option<&Node>, schema_node: &SchemaNode) -> Diff {
    match schema_node.kind {
        NodeKind::Leaf => {
            let b = before.and_then(Node::as_leaf_value).map(str::to_owned);
            let a = after.and_then(Node::as_leaf_value).map(str::to_owned);
            let status = match (&b, &a) {
                (None, None) => DiffStatus::Unchanged,
                (None, Some(_)) => DiffStatus::Added,
                (Some(_), None) => DiffStatus::Deleted,
                (Some(x), Some(y)) if x == y => DiffStatus::Unchanged,
                (Some(_), Some(_)) => DiffStatus::Changed,
            };
            Diff { name: schema_node.name.clone(), status, before: b, after: a, children: Vec::new() }
        }
        NodeKind::LeafList => {
            let b: Vec<String> = before.and_then(Node::as_leaf_list).unwrap_or(&[]).to_vec();
            let a: Vec<String> = after.and_then(Node::as_leaf_list).unwrap_or(&[]).to_vec();
            let status = if b.is_empty() && a.is_empty() {
                DiffStatus::Unchanged
            } else if b.is_empty() {
                DiffStatus::Added
            } else if a.is_empty() {
                DiffStatus::Deleted
            } else if b == a {
                DiffStatus::Unchanged
            } else {
                DiffStatus::Changed
            };
            let children = leaf_list_entry_diffs(&b, &a);
            Diff { name: schema_node.name.clone(), status, before: None, after: None, children }
        }
        NodeKind::Container => {
            let before_c = before.and_then(Node::as_container);
            let after_c = after.and_then(Node::as_container);
            let status = match (before_c.is_some(), after_c.is_some()) {
                (false, false) => DiffStatus::Unchanged,
                (false, true) => DiffStatus::Added,
                (true, false) => DiffStatus::Deleted,
                (true, true) => DiffStatus::Unchanged, // refined below
            };
            let mut children = Vec::new();
            diff_container_children(before_c, after_c, schema_node, &mut children);
            let status = if status == DiffStatus::Unchanged && children.iter().any(|c| c.status != DiffStatus::Unchanged) {
                DiffStatus::Changed
            } else {
                status
            };
            Diff { name: schema_node.name.clone(), status, before: None, after: None, children }
        }
        NodeKind::List => {
            let before_entries = before.and_then(Node::as_list).map(|(_, e)| e.as_slice()).unwrap_or(&[]);
            let after_entries = after.and_then(Node::as_list).map(|(_, e)| e.as_slice()).unwrap_or(&[]);
            let mut children = Vec::new();
            for (key, b_entry) in before_entries {
                let a_entry = after_entries.iter().find(|(k, _)| k == key).map(|(_, n)| n);
                let mut diff = diff_node(Some(b_entry), a_entry, schema_node);
                diff.name = key.join(",");
                if a_entry.is_none() {
                    diff.status = DiffStatus::Deleted;
                }
                children.push(diff);
            }
            for (key, a_entry) in after_entries {
                if before_entries.iter().any(|(k, _)| k == key) {
                    continue;
                }
                let mut diff = diff_node(None, Some(a_entry), schema_node);
                diff.name = key.join(",");
                diff.status = DiffStatus::Added;
                children.push(diff);
            }
            let status = if children.is_empty() {
                DiffStatus::Unchanged
            } else if children.iter().all(|c| c.status == DiffStatus::Added) && before_entries.is_empty() {
                DiffStatus::Added
            } else if children.iter().all(|c| c.status == DiffStatus::Deleted) && after_entries.is_empty() {
                DiffStatus::Deleted
            } else if children.iter().any(|c| c.status != DiffStatus::Unchanged) {
                DiffStatus::Changed
            } else {
                DiffStatus::Unchanged
            };
            Diff { name: schema_node.name.clone(), status, before: None, after: None, children }
        }
        NodeKind::Choice | NodeKind::Case => unreachable!("transparent nodes are flattened by the caller"),
    }
}

fn diff_container_children(before_c: Option<&confd_tree::Container>, after_c: Option<&confd_tree::Container>, schema_node: &SchemaNode, out: &mut Vec<Diff>) {
    for child_schema in schema_node.children_in_order() {
        if matches!(child_schema.kind, NodeKind::Choice | NodeKind::Case) {
            diff_container_children(before_c, after_c, child_schema, out);
            continue;
        }
        let b = before_c.and_then(|c| c.get(&child_schema.name));
        let a = after_c.and_then(|c| c.get(&child_schema.name));
        if b.is_none() && a.is_none() {
            continue;
        }
        out.push(diff_node(b, a, child_schema));
    }
}

fn leaf_list_entry_diffs(before: &[String], after: &[String]) -> Vec<Diff> {
    let mut out = Vec::new();
    for v in before {
        if !after.contains(v) {
            out.push(Diff { name: v.clone(), status: DiffStatus::Deleted, before: Some(v.clone()), after: None, children: Vec::new() });
        }
    }
    for v in after {
        if !before.contains(v) {
            out.push(Diff { name: v.clone(), status: DiffStatus::Added, before: None, after: Some(v.clone()), children: Vec::new() });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use confd_schema::fixtures::sample_schema;
    use confd_tree::Tree;
    use confd_utils::Path;

    #[test]
    fn unchanged_leaf_reports_unchanged() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        tree.set_leaf(&schema, &Path::parse("mtu"), Some("1400")).unwrap();

        let result = diff(Some(tree.root()), Some(tree.root()), schema.root());
        assert_eq!(result.status, DiffStatus::Unchanged);
    }

    #[test]
    fn changed_leaf_value_reported_as_child_but_root_stays_unchanged() {
        let schema = sample_schema();
        let mut before = Tree::new();
        before.set_leaf(&schema, &Path::parse("mtu"), Some("1400")).unwrap();
        let mut after = Tree::new();
        after.set_leaf(&schema, &Path::parse("mtu"), Some("9000")).unwrap();

        let result = diff(Some(before.root()), Some(after.root()), schema.root());
        assert_eq!(result.status, DiffStatus::Unchanged);
        let mtu_diff = result.children.iter().find(|c| c.name == "mtu").unwrap();
        assert_eq!(mtu_diff.status, DiffStatus::Changed);
        assert_eq!(mtu_diff.before.as_deref(), Some("1400"));
        assert_eq!(mtu_diff.after.as_deref(), Some("9000"));
    }

    #[test]
    fn added_list_entry_is_flagged_added_not_changed() {
        let schema = sample_schema();
        let before = Tree::new();
        let mut after = Tree::new();
        let area = Path::parse("protocols/ospf/area");
        after.create_list_entry(&schema, &area, &["0".into()]).unwrap();

        let result = diff(Some(before.root()), Some(after.root()), schema.root());
        let protocols = result.children.iter().find(|c| c.name == "protocols").unwrap();
        assert_eq!(protocols.status, DiffStatus::Added);
    }
}
