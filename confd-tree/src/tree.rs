//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use confd_schema::node::Node as SchemaNode;
use confd_schema::{LeafType, NodeKind, Ordering, Schema};
use confd_utils::Path;

use crate::error::Error;
use crate::node::{resort_if_system, Container, Node};

/// The in-memory ordered configuration tree (spec §3, §4.B "Config Tree").
///
/// A bare `Tree` carries no notion of candidate-vs-running; it's the
/// physical storage both sides are built from. [`Tree::delete`] always
/// removes the node outright — tracking a tombstone so a later `Merge`
/// can suppress a value inherited from running is `confd-view`'s job
/// (the Union View owns candidate-over-running overlay semantics, spec
/// §4.C), via [`Tree::mark_deleted`].
#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    root: Node,
}

impl Default for Tree {
    fn default() -> Self {
        Tree::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        Tree { root: Node::container() }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn exists(&self, schema: &Schema, path: &Path) -> Result<bool, Error> {
        Ok(self.get_opt(schema, path)?.is_some())
    }

    pub fn get(&self, schema: &Schema, path: &Path) -> Result<&Node, Error> {
        self.get_opt(schema, path)?
            .ok_or_else(|| Error::NodeDoesntExist(path.clone()))
    }

    /// A leaf is "default" when the schema declares a default for it and
    /// nothing explicit is stored at `path` (spec §3 "Default values are
    /// never stored in the tree").
    pub fn is_default(&self, schema: &Schema, path: &Path) -> Result<bool, Error> {
        let snode = schema
            .descendant(path)
            .ok_or_else(|| Error::UnknownElement(path.clone()))?;
        if snode.default.is_none() {
            return Ok(false);
        }
        Ok(self.get_opt(schema, path)?.is_none())
    }

    fn get_opt(&self, schema: &Schema, path: &Path) -> Result<Option<&Node>, Error> {
        if path.is_empty() {
            return Ok(Some(&self.root));
        }
        schema.validate(path, false)?;
        Ok(locate(&self.root, schema.root(), path.components()))
    }

    /// Explicitly creates a presence container. Fails with
    /// [`Error::NodeExists`] if it's already present.
    pub fn create_presence_container(&mut self, schema: &Schema, path: &Path) -> Result<(), Error> {
        let snode = schema
            .descendant(path)
            .ok_or_else(|| Error::UnknownElement(path.clone()))?;
        if snode.kind != NodeKind::Container || !snode.presence {
            return Err(Error::UnknownElement(path.clone()));
        }
        let (name, _) = path.split_last().ok_or_else(|| Error::UnknownElement(path.clone()))?;
        let parent = descend_to_parent_mut(&mut self.root, schema, path, true)?;
        if parent.contains(name) {
            return Err(Error::NodeExists(path.clone()));
        }
        parent.insert(name, Node::container());
        Ok(())
    }

    /// Explicitly creates a list entry with the given key values. Fails
    /// with [`Error::NodeExists`] if that key tuple is already present.
    pub fn create_list_entry(
        &mut self,
        schema: &Schema,
        list_path: &Path,
        key_values: &[String],
    ) -> Result<(), Error> {
        let snode = schema
            .descendant(list_path)
            .ok_or_else(|| Error::UnknownElement(list_path.clone()))?;
        if snode.kind != NodeKind::List || key_values.len() != snode.keys.len() {
            return Err(Error::UnknownElement(list_path.clone()));
        }
        let (name, _) = list_path
            .split_last()
            .ok_or_else(|| Error::UnknownElement(list_path.clone()))?;
        let parent = descend_to_parent_mut(&mut self.root, schema, list_path, true)?;
        if !parent.contains(name) {
            parent.insert(
                name,
                Node::List { ordered_by: snode.ordered_by, entries: Vec::new() },
            );
        }
        let list_node = parent.get_mut(name).expect("just inserted or present");
        let (_, entries) = list_node.as_list_mut().ok_or_else(|| Error::UnknownElement(list_path.clone()))?;
        if entries.iter().any(|(k, _)| k.as_slice() == key_values) {
            return Err(Error::NodeExists(list_path.clone()));
        }
        let mut entry = Container::new();
        for (key_name, key_value) in snode.keys.iter().zip(key_values) {
            entry.insert(key_name.clone(), Node::Leaf(key_value.clone()));
        }
        entries.push((key_values.to_vec(), Node::Container(entry)));
        resort_if_system(snode.ordered_by, entries);
        Ok(())
    }

    /// Sets a leaf's value (create-or-update; spec §4.B `Set`). `value`
    /// is ignored for `empty`-typed leaves.
    pub fn set_leaf(&mut self, schema: &Schema, path: &Path, value: Option<&str>) -> Result<(), Error> {
        let snode = schema
            .descendant(path)
            .ok_or_else(|| Error::UnknownElement(path.clone()))?;
        if snode.kind != NodeKind::Leaf {
            return Err(Error::UnknownElement(path.clone()));
        }
        let node = match (&snode.leaf_type, value) {
            (Some(LeafType::Empty), _) => Node::LeafEmpty,
            (_, Some(v)) => Node::Leaf(v.to_owned()),
            (_, None) => return Err(Error::UnknownElement(path.clone())),
        };
        let (name, _) = path.split_last().ok_or_else(|| Error::UnknownElement(path.clone()))?;
        let parent = descend_to_parent_mut(&mut self.root, schema, path, true)?;
        parent.insert(name, node);
        Ok(())
    }

    /// Replaces `path` in the candidate with an explicit deletion marker
    /// (spec §4.C delegates the Union View's `Delete` down to this when
    /// the value being removed is inherited from running).
    pub fn mark_deleted(&mut self, schema: &Schema, path: &Path) -> Result<(), Error> {
        if path.is_empty() {
            return Err(Error::UnknownElement(path.clone()));
        }
        schema.validate(path, false)?;
        let (name, _) = path.split_last().unwrap();
        let parent = descend_to_parent_mut(&mut self.root, schema, path, true)?;
        parent.insert(name, Node::Deleted);
        Ok(())
    }

    /// Inserts a leaf-list value if not already present.
    pub fn leaf_list_insert(&mut self, schema: &Schema, path: &Path, value: &str) -> Result<(), Error> {
        let snode = schema
            .descendant(path)
            .ok_or_else(|| Error::UnknownElement(path.clone()))?;
        if snode.kind != NodeKind::LeafList {
            return Err(Error::UnknownElement(path.clone()));
        }
        let (name, _) = path.split_last().unwrap();
        let parent = descend_to_parent_mut(&mut self.root, schema, path, true)?;
        if !parent.contains(name) {
            parent.insert(
                name,
                Node::LeafList { ordered_by: snode.ordered_by, values: Vec::new() },
            );
        }
        if let Node::LeafList { ordered_by, values } = parent.get_mut(name).unwrap() {
            if !values.iter().any(|v| v == value) {
                values.push(value.to_owned());
                if *ordered_by == Ordering::System {
                    values.sort();
                }
            }
        }
        Ok(())
    }

    pub fn leaf_list_remove(&mut self, schema: &Schema, path: &Path, value: &str) -> Result<(), Error> {
        let (name, _) = path.split_last().ok_or_else(|| Error::UnknownElement(path.clone()))?;
        let parent = descend_to_parent_mut(&mut self.root, schema, path, false)?;
        let removed = match parent.get_mut(name) {
            Some(Node::LeafList { values, .. }) => {
                let before = values.len();
                values.retain(|v| v != value);
                before != values.len()
            }
            _ => false,
        };
        if !removed {
            return Err(Error::NodeDoesntExist(path.clone()));
        }
        if matches!(parent.get(name), Some(Node::LeafList { values, .. }) if values.is_empty()) {
            parent.remove(name);
        }
        Ok(())
    }

    /// Physically removes `path` (spec §4.B `Delete`), pruning any
    /// non-presence container ancestor left empty by the removal.
    pub fn delete(&mut self, schema: &Schema, path: &Path) -> Result<(), Error> {
        if path.is_empty() {
            return Err(Error::UnknownElement(path.clone()));
        }
        schema.validate(path, false)?;
        delete_rec(&mut self.root, schema.root(), path.components(), 0, path)
    }

    /// Produces a fresh tree overlaying `candidate` on `running` (spec
    /// §4.B `Merge`); `include_defaults` synthesizes default leaf values
    /// that neither side set explicitly.
    pub fn merge(candidate: &Tree, running: &Tree, schema: &Schema, include_defaults: bool) -> Tree {
        let cand_c = candidate.root.as_container();
        let run_c = running.root.as_container();
        Tree {
            root: Node::Container(merge_container(cand_c, run_c, schema.root(), include_defaults)),
        }
    }

    /// `Merge` with `include_defaults = false` (spec §4.B
    /// `MergeWithoutDefaults`, used by Commit Mgr to promote Running).
    pub fn merge_without_defaults(candidate: &Tree, running: &Tree, schema: &Schema) -> Tree {
        Tree::merge(candidate, running, schema, false)
    }
}

fn locate<'t>(mut cur: &'t Node, mut schema_node: &'_ SchemaNode, components: &[String]) -> Option<&'t Node> {
    let mut i = 0;
    while i < components.len() {
        let name = &components[i];
        let child_schema = schema_node.resolve_child(name)?;
        i += 1;
        if child_schema.kind == NodeKind::List {
            let nkeys = child_schema.keys.len();
            let container = cur.as_container()?;
            let list_node = container.get(name)?;
            if components.len() - i < nkeys {
                // No (or too few) key components left: by the time a
                // caller reaches here the path has already passed
                // `Schema::validate`, which only accepts this when
                // nothing remains at all — i.e. the path addresses the
                // list as a whole (spec §4.B has no separate "List"
                // node kind of its own to return here).
                cur = list_node;
                schema_node = child_schema;
                continue;
            }
            let key_values = &components[i..i + nkeys];
            i += nkeys;
            let (_, entries) = list_node.as_list()?;
            let (_, entry_node) = entries.iter().find(|(k, _)| k.as_slice() == key_values)?;
            cur = entry_node;
        } else {
            let container = cur.as_container()?;
            cur = container.get(name)?;
        }
        schema_node = child_schema;
    }
    Some(cur)
}

/// Walks to the container that directly holds `path`'s last component,
/// creating non-presence containers along the way when `create_np` is
/// set. Presence containers and list entries are never auto-created;
/// their absence is a [`Error::NodeDoesntExist`].
fn descend_to_parent_mut<'t>(
    root: &'t mut Node,
    schema: &Schema,
    path: &Path,
    create_np: bool,
) -> Result<&'t mut Container, Error> {
    let components = path.components();
    if components.is_empty() {
        return root.as_container_mut().ok_or_else(|| Error::UnknownElement(path.clone()));
    }
    let parent_len = components.len() - 1;
    let mut cur = root;
    let mut schema_node = schema.root();
    let mut i = 0;
    while i < parent_len {
        let name = &components[i];
        let child_schema = schema_node
            .resolve_child(name)
            .ok_or_else(|| Error::UnknownElement(path.clone()))?;
        i += 1;
        let container = cur.as_container_mut().ok_or_else(|| Error::UnknownElement(path.clone()))?;
        if child_schema.kind == NodeKind::List {
            let nkeys = child_schema.keys.len();
            if parent_len - i < nkeys {
                return Err(Error::UnknownElement(path.clone()));
            }
            let key_values = &components[i..i + nkeys];
            i += nkeys;
            let list_node = container.get_mut(name).ok_or_else(|| Error::NodeDoesntExist(path.clone()))?;
            let (_, entries) = list_node.as_list_mut().ok_or_else(|| Error::UnknownElement(path.clone()))?;
            cur = entries
                .iter_mut()
                .find(|(k, _)| k.as_slice() == key_values)
                .map(|(_, node)| node)
                .ok_or_else(|| Error::NodeDoesntExist(path.clone()))?;
        } else {
            if !container.contains(name) {
                if create_np && child_schema.is_np_container() {
                    container.insert(name.clone(), Node::container());
                } else {
                    return Err(Error::NodeDoesntExist(path.clone()));
                }
            }
            cur = container.get_mut(name).unwrap();
        }
        schema_node = child_schema;
    }
    cur.as_container_mut().ok_or_else(|| Error::UnknownElement(path.clone()))
}

fn delete_rec(
    node: &mut Node,
    schema_node: &SchemaNode,
    components: &[String],
    idx: usize,
    path: &Path,
) -> Result<(), Error> {
    let name = &components[idx];
    let child_schema = schema_node
        .resolve_child(name)
        .ok_or_else(|| Error::UnknownElement(path.clone()))?;
    let container = node.as_container_mut().ok_or_else(|| Error::UnknownElement(path.clone()))?;

    if child_schema.kind == NodeKind::List {
        let nkeys = child_schema.keys.len();
        if components.len() - (idx + 1) < nkeys {
            return Err(Error::UnknownElement(path.clone()));
        }
        let key_values = components[idx + 1..idx + 1 + nkeys].to_vec();
        let end_of_entry = idx + 1 + nkeys == components.len();

        let list_node = container.get_mut(name).ok_or_else(|| Error::NodeDoesntExist(path.clone()))?;
        let (_, entries) = list_node.as_list_mut().ok_or_else(|| Error::UnknownElement(path.clone()))?;
        let pos = entries
            .iter()
            .position(|(k, _)| *k == key_values)
            .ok_or_else(|| Error::NodeDoesntExist(path.clone()))?;

        if end_of_entry {
            entries.remove(pos);
        } else {
            let (_, entry_node) = &mut entries[pos];
            delete_rec(entry_node, child_schema, components, idx + 1 + nkeys, path)?;
            let keep = entry_node.as_container().map(|c| !c.is_empty()).unwrap_or(true);
            if !keep {
                entries.remove(pos);
            }
        }
        if entries.is_empty() {
            container.remove(name);
        }
        return Ok(());
    }

    if idx + 1 == components.len() {
        container.remove(name).ok_or_else(|| Error::NodeDoesntExist(path.clone()))?;
        return Ok(());
    }

    let child_node = container.get_mut(name).ok_or_else(|| Error::NodeDoesntExist(path.clone()))?;
    delete_rec(child_node, child_schema, components, idx + 1, path)?;
    if child_schema.is_np_container() {
        let prunable = child_node.as_container().map(|c| c.is_empty()).unwrap_or(false);
        if prunable {
            container.remove(name);
        }
    }
    Ok(())
}

fn merge_node(
    cand: Option<&Node>,
    run: Option<&Node>,
    schema_node: &SchemaNode,
    include_defaults: bool,
) -> Option<Node> {
    if matches!(cand, Some(Node::Deleted)) {
        return None;
    }
    match schema_node.kind {
        NodeKind::Container => {
            let cand_c = cand.and_then(Node::as_container);
            let run_c = run.and_then(Node::as_container);
            if schema_node.presence {
                // Presence is itself data: existing structurally (even
                // empty) is what "present" means.
                let exists = if cand.is_some() { cand_c.is_some() } else { run_c.is_some() };
                if !exists {
                    return None;
                }
                Some(Node::Container(merge_container(cand_c, run_c, schema_node, include_defaults)))
            } else {
                // A non-presence container is only logically present
                // while it has a child (spec §3 invariants); one whose
                // only children were suppressed by tombstones or never
                // set must vanish from the merged view too, not just on
                // physical `Delete`.
                let merged = merge_container(cand_c, run_c, schema_node, include_defaults);
                if merged.is_empty() {
                    None
                } else {
                    Some(Node::Container(merged))
                }
            }
        }
        NodeKind::List => {
            let cand_entries = cand.and_then(Node::as_list).map(|(_, e)| e.as_slice()).unwrap_or(&[]);
            let run_entries = run.and_then(Node::as_list).map(|(_, e)| e.as_slice()).unwrap_or(&[]);
            let mut out: Vec<(Vec<String>, Node)> = Vec::new();
            for (key, cnode) in cand_entries {
                if matches!(cnode, Node::Deleted) {
                    continue;
                }
                let run_match = run_entries.iter().find(|(k, _)| k == key).map(|(_, n)| n);
                let cand_entry_c = cnode.as_container();
                let run_entry_c = run_match.and_then(Node::as_container);
                out.push((
                    key.clone(),
                    Node::Container(merge_container(cand_entry_c, run_entry_c, schema_node, include_defaults)),
                ));
            }
            for (key, rnode) in run_entries {
                if cand_entries.iter().any(|(k, _)| k == key) {
                    continue;
                }
                out.push((
                    key.clone(),
                    Node::Container(merge_container(None, rnode.as_container(), schema_node, include_defaults)),
                ));
            }
            if out.is_empty() {
                return None;
            }
            resort_if_system(schema_node.ordered_by, &mut out);
            Some(Node::List { ordered_by: schema_node.ordered_by, entries: out })
        }
        NodeKind::Leaf | NodeKind::LeafList => cand.or(run).cloned(),
        NodeKind::Choice | NodeKind::Case => unreachable!("transparent nodes never hold their own value"),
    }
}

fn merge_container(
    cand_c: Option<&Container>,
    run_c: Option<&Container>,
    schema_node: &SchemaNode,
    include_defaults: bool,
) -> Container {
    let mut out = Container::new();
    merge_container_into(cand_c, run_c, schema_node, include_defaults, &mut out);
    out
}

fn merge_container_into(
    cand_c: Option<&Container>,
    run_c: Option<&Container>,
    schema_node: &SchemaNode,
    include_defaults: bool,
    out: &mut Container,
) {
    for child_schema in schema_node.children_in_order() {
        if matches!(child_schema.kind, NodeKind::Choice | NodeKind::Case) {
            merge_container_into(cand_c, run_c, child_schema, include_defaults, out);
            continue;
        }
        let cand_child = cand_c.and_then(|c| c.get(&child_schema.name));
        let run_child = run_c.and_then(|c| c.get(&child_schema.name));
        if let Some(merged) = merge_node(cand_child, run_child, child_schema, include_defaults) {
            out.insert(child_schema.name.clone(), merged);
        } else if include_defaults && child_schema.kind == NodeKind::Leaf {
            if let Some(default) = &child_schema.default {
                out.insert(child_schema.name.clone(), Node::Leaf(default.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confd_schema::fixtures::sample_schema;

    #[test]
    fn set_and_get_leaf_through_list_keys() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        let area = Path::parse("protocols/ospf/area");
        tree.create_list_entry(&schema, &area, &["0".into()]).unwrap();

        let area_network = Path::parse("protocols/ospf/area/0/network");
        tree.leaf_list_insert(&schema, &area_network, "10.0.0.0/24").unwrap();

        let entry_path = Path::parse("protocols/ospf/area/0");
        assert!(tree.exists(&schema, &entry_path).unwrap());
        let values = tree
            .get(&schema, &area_network)
            .unwrap()
            .as_leaf_list()
            .unwrap();
        assert_eq!(values.to_vec(), vec!["10.0.0.0/24".to_string()]);
    }

    #[test]
    fn create_list_entry_twice_fails() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        let area = Path::parse("protocols/ospf/area");
        tree.create_list_entry(&schema, &area, &["0".into()]).unwrap();
        let err = tree.create_list_entry(&schema, &area, &["0".into()]).unwrap_err();
        assert!(matches!(err, Error::NodeExists(_)));
    }

    #[test]
    fn delete_prunes_empty_non_presence_ancestors() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        let x_y = Path::parse("x/y");
        tree.set_leaf(&schema, &x_y, None).unwrap();
        assert!(tree.exists(&schema, &Path::parse("x")).unwrap());

        tree.delete(&schema, &x_y).unwrap();
        assert!(!tree.exists(&schema, &Path::parse("x")).unwrap());
    }

    #[test]
    fn delete_presence_container_is_explicit_and_not_autocreated() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        let p = Path::parse("p");
        let m = Path::parse("p/m");

        // Setting a descendant of an absent presence container fails:
        // presence containers are never auto-vivified at this layer.
        assert!(tree.set_leaf(&schema, &m, Some("x")).is_err());

        tree.create_presence_container(&schema, &p).unwrap();
        tree.set_leaf(&schema, &m, Some("x")).unwrap();
        tree.delete(&schema, &p).unwrap();
        assert!(!tree.exists(&schema, &p).unwrap());
    }

    #[test]
    fn merge_candidate_wins_and_tombstone_suppresses_running() {
        let schema = sample_schema();

        let mut running = Tree::new();
        running.set_leaf(&schema, &Path::parse("mtu"), Some("9000")).unwrap();
        running.set_leaf(&schema, &Path::parse("password"), Some("hunter2")).unwrap();

        let mut candidate = Tree::new();
        candidate.set_leaf(&schema, &Path::parse("mtu"), Some("1400")).unwrap();
        candidate.mark_deleted(&schema, &Path::parse("password")).unwrap();

        let merged = Tree::merge(&candidate, &running, &schema, false);
        assert_eq!(
            merged.get(&schema, &Path::parse("mtu")).unwrap().as_leaf_value(),
            Some("1400")
        );
        assert!(!merged.exists(&schema, &Path::parse("password")).unwrap());
    }

    #[test]
    fn merge_with_defaults_synthesizes_unset_leaf() {
        let schema = sample_schema();
        let running = Tree::new();
        let candidate = Tree::new();

        let without = Tree::merge_without_defaults(&candidate, &running, &schema);
        assert!(!without.exists(&schema, &Path::parse("mtu")).unwrap());

        let with = Tree::merge(&candidate, &running, &schema, true);
        assert_eq!(
            with.get(&schema, &Path::parse("mtu")).unwrap().as_leaf_value(),
            Some("1500")
        );
    }

    #[test]
    fn is_default_true_only_when_unset() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        assert!(tree.is_default(&schema, &Path::parse("mtu")).unwrap());
        tree.set_leaf(&schema, &Path::parse("mtu"), Some("1500")).unwrap();
        assert!(!tree.is_default(&schema, &Path::parse("mtu")).unwrap());
    }
}
