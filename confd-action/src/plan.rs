//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use confd_schema::{Hooks, Node as SchemaNode, NodeKind};
use confd_tree::node::Container;
use confd_tree::{Node as TreeNode, Tree};
use confd_utils::Path;

/// `CONFIGD_EXT` values a hook can run under (spec §4.G, §6). `Validate`/
/// `Syntax` are run outside commit, by [`crate::run_validate_hooks`]; the
/// other five are what [`crate::plan`] schedules.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HookKind {
    Begin,
    Create,
    Update,
    Delete,
    End,
    Validate,
    Syntax,
}

impl HookKind {
    pub fn as_ext(&self) -> &'static str {
        match self {
            HookKind::Begin => "begin",
            HookKind::Create => "create",
            HookKind::Update => "update",
            HookKind::Delete => "delete",
            HookKind::End => "end",
            HookKind::Validate => "validate",
            HookKind::Syntax => "syntax",
        }
    }
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ext())
    }
}

/// `COMMIT_ACTION` (spec §4.G, §6): whether the enclosing transition is a
/// set (create/update) or a delete.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommitAction {
    Set,
    Delete,
}

impl CommitAction {
    pub fn as_env(&self) -> &'static str {
        match self {
            CommitAction::Set => "SET",
            CommitAction::Delete => "DELETE",
        }
    }
}

/// One scheduled hook invocation: a node, the lifecycle point it fires at,
/// and the priority group it was sorted into (spec §4.G).
#[derive(Clone, Debug)]
pub struct Action {
    pub path: Path,
    pub kind: HookKind,
    pub command: String,
    pub priority: u32,
    pub commit_action: CommitAction,
}

#[derive(Clone, Copy, Eq, PartialEq)]
enum Transition {
    Added,
    Deleted,
    Modified,
}

/// Builds the ordered hook-invocation stream for a commit from `before`
/// (running) to `after` (candidate merged without defaults) (spec §4.G
/// rules 1-3). Unchanged subtrees contribute nothing and aren't
/// descended into.
///
/// Ordering is produced in two passes: a depth-first walk emits each
/// node's actions in the bracket order rule 2 specifies, tagged with the
/// nearest-ancestor-inclusive priority the node resolves to; a final
/// stable sort by that priority turns the per-subtree streams into one
/// globally priority-ordered stream (rule 3), without disturbing the
/// relative order two actions already had within the same priority
/// (in particular, one list entry's whole block stays contiguous since
/// it's built before the next entry's is even started).
pub fn plan(before: &Tree, after: &Tree, schema: &confd_schema::Schema) -> Vec<Action> {
    let mut out = Vec::new();
    let root_before = before.root().as_container();
    let root_after = after.root().as_container();
    walk_container(root_before, root_after, schema.root(), &Path::root(), 500, &mut out);
    out.sort_by_key(|a| a.priority);
    out
}

fn effective_priority(schema_node: &SchemaNode, inherited: u32) -> u32 {
    schema_node.priority.unwrap_or(inherited)
}

fn walk_node(
    before: Option<&TreeNode>,
    after: Option<&TreeNode>,
    schema_node: &SchemaNode,
    path: &Path,
    inherited_priority: u32,
    out: &mut Vec<Action>,
) {
    match schema_node.kind {
        NodeKind::Choice | NodeKind::Case => {
            // Transparent: `before`/`after` here are still the enclosing
            // container's children map, reached via the caller iterating
            // `schema_node.children_in_order()` recursively.
            unreachable!("choice/case are flattened by the caller before walk_node is reached")
        }
        NodeKind::Leaf => {
            walk_leaf(before.and_then(TreeNode::as_leaf_value), after.and_then(TreeNode::as_leaf_value), schema_node, path, inherited_priority, out)
        }
        NodeKind::LeafList => walk_leaf_list(
            before.and_then(TreeNode::as_leaf_list),
            after.and_then(TreeNode::as_leaf_list),
            schema_node,
            path,
            inherited_priority,
            out,
        ),
        NodeKind::Container => walk_container(
            before.and_then(TreeNode::as_container),
            after.and_then(TreeNode::as_container),
            schema_node,
            path,
            inherited_priority,
            out,
        ),
        NodeKind::List => walk_list(before.and_then(TreeNode::as_list), after.and_then(TreeNode::as_list), schema_node, path, inherited_priority, out),
    }
}

fn walk_container(
    before: Option<&Container>,
    after: Option<&Container>,
    schema_node: &SchemaNode,
    path: &Path,
    inherited_priority: u32,
    out: &mut Vec<Action>,
) {
    let priority = effective_priority(schema_node, inherited_priority);
    let mut children = Vec::new();
    collect_children(before, after, schema_node, path, priority, &mut children);

    let transition = match (before.is_some(), after.is_some()) {
        (false, false) => return,
        (false, true) => Transition::Added,
        (true, false) => Transition::Deleted,
        (true, true) => Transition::Modified,
    };
    if transition == Transition::Modified && children.is_empty() {
        // Existed before and after with no descendant change: nothing to
        // do for this subtree at all.
        return;
    }
    emit_subtree(path, &schema_node.hooks, transition, priority, children, out);
}

/// Recurses into `schema_node`'s children (transparently flattening
/// `Choice`/`Case`), in schema order, appending each child's own actions
/// to `out`.
fn collect_children(
    before: Option<&Container>,
    after: Option<&Container>,
    schema_node: &SchemaNode,
    path: &Path,
    priority: u32,
    out: &mut Vec<Action>,
) {
    for child_schema in schema_node.children_in_order() {
        if matches!(child_schema.kind, NodeKind::Choice | NodeKind::Case) {
            collect_children(before, after, child_schema, path, priority, out);
            continue;
        }
        let b = before.and_then(|c| c.get(&child_schema.name));
        let a = after.and_then(|c| c.get(&child_schema.name));
        if b.is_none() && a.is_none() {
            continue;
        }
        walk_node(b, a, child_schema, &path.push(child_schema.name.clone()), priority, out);
    }
}

fn walk_list(
    before: Option<(&confd_schema::Ordering, &Vec<(Vec<String>, TreeNode)>)>,
    after: Option<(&confd_schema::Ordering, &Vec<(Vec<String>, TreeNode)>)>,
    schema_node: &SchemaNode,
    path: &Path,
    inherited_priority: u32,
    out: &mut Vec<Action>,
) {
    let priority = effective_priority(schema_node, inherited_priority);
    let before_entries = before.map(|(_, e)| e.as_slice()).unwrap_or(&[]);
    let after_entries = after.map(|(_, e)| e.as_slice()).unwrap_or(&[]);

    for (key, b_entry) in before_entries {
        let a_entry = after_entries.iter().find(|(k, _)| k == key).map(|(_, n)| n);
        let entry_path = key.iter().fold(path.clone(), |p, k| p.push(k.clone()));
        walk_container(b_entry.as_container(), a_entry.and_then(TreeNode::as_container), schema_node, &entry_path, priority, out);
    }
    for (key, a_entry) in after_entries {
        if before_entries.iter().any(|(k, _)| k == key) {
            continue;
        }
        let entry_path = key.iter().fold(path.clone(), |p, k| p.push(k.clone()));
        walk_container(None, a_entry.as_container(), schema_node, &entry_path, priority, out);
    }
}

fn walk_leaf(before: Option<&str>, after: Option<&str>, schema_node: &SchemaNode, path: &Path, inherited_priority: u32, out: &mut Vec<Action>) {
    let transition = match (before, after) {
        (None, None) => return,
        (None, Some(_)) => Transition::Added,
        (Some(x), Some(y)) if x == y => return,
        (Some(_), Some(_)) => Transition::Modified,
        (Some(_), None) => Transition::Deleted,
    };
    let priority = effective_priority(schema_node, inherited_priority);
    emit_subtree(path, &schema_node.hooks, transition, priority, Vec::new(), out);
}

fn walk_leaf_list(before: Option<&[String]>, after: Option<&[String]>, schema_node: &SchemaNode, path: &Path, inherited_priority: u32, out: &mut Vec<Action>) {
    let transition = match (before, after) {
        (None, None) => return,
        (None, Some(_)) => Transition::Added,
        (Some(x), Some(y)) if x == y => return,
        (Some(_), Some(_)) => Transition::Modified,
        (Some(_), None) => Transition::Deleted,
    };
    let priority = effective_priority(schema_node, inherited_priority);
    emit_subtree(path, &schema_node.hooks, transition, priority, Vec::new(), out);
}

/// Applies spec §4.G rule 2's bracket ordering for a single node given its
/// transition, appending to `out`. `children` are this node's own
/// already-computed descendant actions (empty for leaves).
fn emit_subtree(path: &Path, hooks: &Hooks, transition: Transition, priority: u32, children: Vec<Action>, out: &mut Vec<Action>) {
    let commit_action = if transition == Transition::Deleted { CommitAction::Delete } else { CommitAction::Set };

    let action_for = |kind: HookKind, cmd: &Option<String>| {
        cmd.as_ref().map(|cmd| Action { path: path.clone(), kind, command: cmd.clone(), priority, commit_action })
    };
    let begin = action_for(HookKind::Begin, &hooks.begin);
    let end = action_for(HookKind::End, &hooks.end);
    let main = match transition {
        Transition::Added => action_for(HookKind::Create, &hooks.create),
        Transition::Modified => action_for(HookKind::Update, &hooks.update),
        Transition::Deleted => action_for(HookKind::Delete, &hooks.delete),
    };

    match transition {
        // Node's own begin/create/end bracket fires as a whole before any
        // descendant's actions (spec §4.G rule 2).
        Transition::Added => {
            out.extend(begin);
            out.extend(main);
            out.extend(end);
            out.extend(children);
        }
        // Descendants' own brackets run before this node's begin/delete/end.
        Transition::Deleted => {
            out.extend(children);
            out.extend(begin);
            out.extend(main);
            out.extend(end);
        }
        // begin, then this node's update alongside its descendants', then end.
        Transition::Modified => {
            out.extend(begin);
            out.extend(main);
            out.extend(children);
            out.extend(end);
        }
    }
}

#[cfg(test)]
mod tests {
    use confd_schema::fixtures::sample_schema;
    use confd_tree::Tree;
    use confd_utils::Path;

    use super::*;

    #[test]
    fn priority_ordering_runs_ascending_with_begin_adjacent_to_end() {
        let schema = sample_schema();
        let before = Tree::new();
        let mut after = Tree::new();
        for cname in ["c900", "c500", "c300", "c200", "c100"] {
            after.set_leaf(&schema, &Path::parse(&format!("{cname}/value")), Some("x")).unwrap();
        }

        let actions = plan(&before, &after, &schema);
        let containers: Vec<_> = actions.iter().filter(|a| a.path.components().len() == 1).collect();
        let priorities: Vec<u32> = containers.iter().map(|a| a.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted, "actions must be in ascending priority order");

        // Each container's begin is immediately followed by its own end:
        // its "value" leaf has no `create` hook, so nothing can land
        // between them for a freshly-added container.
        for pair in containers.chunks(2) {
            assert_eq!(pair[0].kind, HookKind::Begin);
            assert_eq!(pair[1].kind, HookKind::End);
            assert_eq!(pair[0].path, pair[1].path);
        }
    }

    #[test]
    fn deleted_subtree_runs_descendants_before_its_own_bracket() {
        let schema = sample_schema();
        let mut before = Tree::new();
        before.set_leaf(&schema, &Path::parse("c100/value"), Some("x")).unwrap();
        let after = Tree::new();

        let actions = plan(&before, &after, &schema);
        assert_eq!(actions.last().unwrap().kind, HookKind::End);
        assert_eq!(actions.last().unwrap().commit_action, CommitAction::Delete);
        assert_eq!(actions.first().unwrap().kind, HookKind::Begin);
    }

    #[test]
    fn unchanged_subtree_plans_nothing() {
        let schema = sample_schema();
        let mut before = Tree::new();
        before.set_leaf(&schema, &Path::parse("c100/value"), Some("x")).unwrap();
        let mut after = Tree::new();
        after.set_leaf(&schema, &Path::parse("c100/value"), Some("x")).unwrap();

        assert!(plan(&before, &after, &schema).is_empty());
    }

    #[test]
    fn two_list_entries_each_run_as_a_contiguous_block() {
        let schema = sample_schema();
        let before = Tree::new();
        let mut after = Tree::new();
        after.create_list_entry(&schema, &Path::parse("protocols/ospf/area"), &["0".into()]).unwrap();
        after.create_list_entry(&schema, &Path::parse("protocols/ospf/area"), &["1".into()]).unwrap();

        let actions = plan(&before, &after, &schema);
        // ospf itself has begin/end hooks at priority 300; both areas'
        // (hookless) actions are nested inside that single bracket, so
        // the only visible actions here are ospf's own begin/end pair.
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].kind, HookKind::Begin);
        assert_eq!(actions[1].kind, HookKind::End);
    }
}
